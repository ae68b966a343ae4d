pub mod content_adapter;

pub use content_adapter::{ContentAdapter, ContentSchema, ImageField, WriteMode};

pub mod enquiries_hooks;
pub mod enquiries_schema;
pub mod enquiries_service;
pub mod enquiries_shared;

pub use enquiries_service::EnquiriesService;

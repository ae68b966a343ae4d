pub mod ordered_service;

pub use ordered_service::OrderedService;

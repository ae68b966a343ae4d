pub mod fun_facts_service;

pub use fun_facts_service::FunFactsService;

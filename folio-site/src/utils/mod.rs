pub mod payload;
pub mod validator;

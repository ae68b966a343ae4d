use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateEnquiry {
    #[validate(required(message = "name is required"), length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(required(message = "email is required"), email(message = "email must be a valid email"))]
    pub email: Option<String>,

    #[validate(required(message = "phone is required"), length(min = 1, max = 32, message = "phone must be 1 to 32 characters"))]
    pub phone: Option<String>,

    #[validate(required(message = "message is required"), length(min = 1, message = "message must not be empty"))]
    pub message: Option<String>,
}

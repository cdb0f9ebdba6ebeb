use validator::Validate;

use super::error::ClientResult;
use crate::dto::auth_dto::{LoginRequest, RegisterRequest};

/// Checks a sign-in or sign-up form with the same rules the server applies.
/// `name` is only present on sign-up.
pub fn validate_credentials(email: &str, password: &str, name: Option<&str>) -> ClientResult<()> {
    match name {
        Some(name) => RegisterRequest {
            email: email.trim().to_string(),
            name: name.to_string(),
            password: password.to_string(),
        }
        .validate()?,
        None => LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
        .validate()?,
    }
    Ok(())
}

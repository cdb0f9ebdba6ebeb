use validator::ValidationError;

pub fn password_has_letter(password: &str) -> Result<(), ValidationError> {
    if password.chars().any(char::is_alphabetic) {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_letter");
        err.message = Some("Password must contain at least one letter".into());
        Err(err)
    }
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

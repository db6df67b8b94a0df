use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;
use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Request body for user registration.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails are stored trimmed and lower-cased.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl RegisterRequest {
    pub fn validate(mut self) -> Result<Self, AuthError> {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);

        if self.name.is_empty() {
            return Err(AuthError::validation("name is required"));
        }
        if !is_valid_email(&self.email) {
            return Err(AuthError::validation("invalid email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(self)
    }
}

impl LoginRequest {
    pub fn validate(mut self) -> Result<Self, AuthError> {
        self.email = normalize_email(&self.email);

        if !is_valid_email(&self.email) {
            return Err(AuthError::validation("invalid email"));
        }
        if self.password.is_empty() {
            return Err(AuthError::validation("password is required"));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn register_normalizes_email_and_name() {
        let req = register("  Ann ", "  Ann@X.com ", "secret1").validate().unwrap();
        assert_eq!(req.name, "Ann");
        assert_eq!(req.email, "ann@x.com");
    }

    #[test]
    fn register_rejects_bad_input() {
        assert!(matches!(
            register(" ", "ann@x.com", "secret1").validate(),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            register("Ann", "ann.x.com", "secret1").validate(),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            register("Ann", "ann@x.com", "12345").validate(),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn password_of_exactly_min_length_is_accepted() {
        assert!(register("Ann", "ann@x.com", "123456").validate().is_ok());
    }

    #[test]
    fn login_requires_password() {
        let req = LoginRequest {
            email: "ann@x.com".into(),
            password: String::new(),
        };
        assert!(matches!(req.validate(), Err(AuthError::Validation(_))));
    }

    #[test]
    fn user_response_serialization() {
        let response = UserResponse {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "ann@x.com".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("ann@x.com"));
        assert!(json.contains("\"name\":\"Ann\""));
        assert!(!json.contains("password"));
    }
}

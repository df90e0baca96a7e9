use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::repo_types::{User, UserRole};
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// New password plus its transient confirmation. The confirmation is checked
/// here and then dropped; it is never persisted.
pub(crate) fn validate_new_password(password: &str, password_confirm: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    if password != password_confirm {
        return Err(ApiError::Validation("passwords are not the same".into()));
    }
    Ok(())
}

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("please provide your name".into()));
        }
        if !is_valid_email(&self.email) {
            return Err(ApiError::Validation("please provide a valid email".into()));
        }
        validate_new_password(&self.password, &self.password_confirm)
    }
}

/// Request body for login. Fields are optional so a missing one is a 400
/// from the handler rather than a body-rejection from the extractor.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password_current: String,
    pub password: String,
    pub password_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: User,
}

/// Response for every flow that issues a token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub status: &'static str,
    pub token: String,
    pub data: UserData,
}

impl AuthResponse {
    pub fn new(token: String, user: User) -> Self {
        Self {
            status: "success",
            token,
            data: UserData { user },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub status: &'static str,
    pub data: UserData,
}

impl UserResponse {
    pub fn new(user: User) -> Self {
        Self {
            status: "success",
            data: UserData { user },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, confirm: &str) -> SignupRequest {
        SignupRequest {
            name: "Test User".into(),
            email: email.into(),
            password: password.into(),
            password_confirm: confirm.into(),
            role: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_signup() {
        assert!(signup("a@b.com", "longenough", "longenough")
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["not-an-email", "a@b", "a b@c.com", ""] {
            let err = signup(email, "longenough", "longenough")
                .validate()
                .unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "email: {email}");
        }
    }

    #[test]
    fn rejects_short_password() {
        let err = signup("a@b.com", "short", "short").validate().unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rejects_mismatched_confirmation() {
        let err = signup("a@b.com", "longenough", "different1")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn rejects_blank_name() {
        let mut req = signup("a@b.com", "longenough", "longenough");
        req.name = "   ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn auth_response_never_contains_a_password_field() {
        use crate::auth::repo_types::UserRole;
        use time::OffsetDateTime;
        use uuid::Uuid;

        let response = AuthResponse::new(
            "header.payload.sig".into(),
            User {
                id: Uuid::new_v4(),
                name: "Test User".into(),
                email: "a@b.com".into(),
                password_hash: Some("$argon2id$secret".into()),
                role: UserRole::User,
                password_changed_at: None,
                password_reset_token: None,
                password_reset_expires: None,
                created_at: OffsetDateTime::now_utc(),
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["token"], "header.payload.sig");

        let user = json["data"]["user"].as_object().unwrap();
        assert!(!user.contains_key("password_hash"));
        assert!(!user.contains_key("password_reset_token"));
        assert!(!user.contains_key("password_reset_expires"));
    }
}

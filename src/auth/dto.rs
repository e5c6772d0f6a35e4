use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;
use crate::validation::Validator;

pub const GENDERS: &[&str] = &["male", "female", "other"];

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require("email", &self.email)
            .email("email", &self.email)
            .max_len("email", &self.email, 254);
        v.strong_password("password", &self.password);
        if let Some(name) = &self.name {
            v.max_len("name", name, 100);
        }
        v.range("age", self.age, 13, 120);
        v.one_of("gender", self.gender.as_deref(), GENDERS);
        v.finish()
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require("email", &self.email).email("email", &self.email);
        v.require("password", &self.password);
        v.finish()
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for explicit token revocation.
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.require("token", &self.token);
        v.strong_password("password", &self.password);
        v.finish()
    }
}

/// Response returned after login, register or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Acknowledgement body for revoke/forgot/reset.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: OffsetDateTime,
    pub last_login_at: Option<OffsetDateTime>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            email: "a@b.com".into(),
            password: "Abc12345!".into(),
            name: Some("Ada".into()),
            age: Some(30),
            gender: Some("female".into()),
        }
    }

    #[test]
    fn valid_register_request_passes() {
        assert!(register_request().validate().is_ok());
    }

    #[test]
    fn register_rejects_bad_email_and_weak_password() {
        let mut req = register_request();
        req.email = "nope".into();
        req.password = "weak".into();
        let err = req.validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert!(fields.contains(&"email"));
                assert!(fields.contains(&"password"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn register_rejects_unknown_gender_and_out_of_range_age() {
        let mut req = register_request();
        req.gender = Some("robot".into());
        req.age = Some(7);
        assert!(req.validate().is_err());
    }

    #[test]
    fn public_user_serialization_omits_nothing_sensitive() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            name: None,
            created_at: OffsetDateTime::now_utc(),
            last_login_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}

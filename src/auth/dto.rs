use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^010-\d{4}-\d{4}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Stored and compared in lowercase.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub agree_to_marketing: bool,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let name_len = self.name.trim().chars().count();
        if !(2..=50).contains(&name_len) {
            return Err(ApiError::Validation(
                "Name must be between 2 and 50 characters".into(),
            ));
        }
        if !is_valid_email(&normalize_email(&self.email)) {
            return Err(ApiError::Validation("Invalid email format".into()));
        }
        let len = self.password.chars().count();
        if !(8..=100).contains(&len) {
            return Err(ApiError::Validation(
                "Password must be between 8 and 100 characters".into(),
            ));
        }
        let has_lower = self.password.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = self.password.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = self.password.chars().any(|c| c.is_ascii_digit());
        if !(has_lower && has_upper && has_digit) {
            return Err(ApiError::Validation(
                "Password must contain upper case, lower case and a digit".into(),
            ));
        }
        if let Some(phone) = self.normalized_phone() {
            if !PHONE_RE.is_match(&phone) {
                return Err(ApiError::Validation(
                    "Phone must match 010-XXXX-XXXX".into(),
                ));
            }
        }
        Ok(())
    }

    /// Empty or whitespace-only phone counts as absent.
    pub fn normalized_phone(&self) -> Option<String> {
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    pub email: String,
}

/// Public view of a user; the password hash never appears here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub agree_to_marketing: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            agree_to_marketing: user.marketing_opt_in,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Login payload: the access token travels in the body, the refresh token
/// only ever travels in the HttpOnly cookie.
#[derive(Debug, Serialize)]
pub struct LoginData {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct RefreshData {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CheckEmailData {
    pub exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            password: "Passw0rdOk".into(),
            phone: Some("010-1234-5678".into()),
            agree_to_marketing: false,
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_short_name() {
        let mut r = request();
        r.name = "J".into();
        assert!(matches!(r.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_bad_email() {
        let mut r = request();
        r.email = "not-an-email".into();
        assert!(matches!(r.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_weak_passwords() {
        for bad in ["short1A", "alllowercase1", "ALLUPPERCASE1", "NoDigitsHere"] {
            let mut r = request();
            r.password = bad.into();
            assert!(matches!(r.validate(), Err(ApiError::Validation(_))), "{bad}");
        }
    }

    #[test]
    fn rejects_bad_phone_format() {
        let mut r = request();
        r.phone = Some("011-1234-5678".into());
        assert!(matches!(r.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn blank_phone_is_absent() {
        let mut r = request();
        r.phone = Some("   ".into());
        assert!(r.normalized_phone().is_none());
        assert!(r.validate().is_ok());
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }

    #[test]
    fn user_response_uses_camel_case() {
        let now = OffsetDateTime::now_utc();
        let response = UserResponse {
            id: Uuid::new_v4(),
            name: "Jane".into(),
            email: "jane@example.com".into(),
            phone: None,
            agree_to_marketing: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["agreeToMarketing"], true);
        assert!(json["createdAt"].is_string());
        assert!(json.get("passwordHash").is_none());
    }
}

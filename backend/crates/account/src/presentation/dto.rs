//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::{PageMeta, TwoFactorSetup, UserListing};
use crate::domain::entity::user::User;

// ============================================================================
// Credentials
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Login request (password step)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login request (second factor)
#[derive(Debug, Clone, Deserialize)]
pub struct Login2faRequest {
    pub email: String,
    pub totp_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub verification_token: String,
}

// ============================================================================
// Two-factor
// ============================================================================

/// Enable 2FA request; the secret comes from `/generate_2fa_secret`
#[derive(Debug, Clone, Deserialize)]
pub struct Enable2faRequest {
    pub totp_secret: String,
    pub totp_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Disable2faRequest {
    pub totp_code: String,
}

/// 2FA provisioning response
#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorSetupResponse {
    /// QR code as base64-encoded PNG
    pub qr_code: String,
    /// Base32 secret for manual entry
    pub totp_secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

impl From<TwoFactorSetup> for TwoFactorSetupResponse {
    fn from(setup: TwoFactorSetup) -> Self {
        Self {
            qr_code: setup.qr_code,
            totp_secret: setup.totp_secret,
            otpauth_url: setup.otpauth_url,
        }
    }
}

// ============================================================================
// Users
// ============================================================================

/// Admin create user request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Admin update request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

/// `GET /users` query string
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub two_factor_enabled: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            email: user.email.as_str().to_string(),
            is_admin: user.is_admin,
            is_verified: user.is_verified,
            two_factor_enabled: user.two_factor_enabled(),
        }
    }
}

/// Pagination envelope; serialized as `{}` when the full list was returned
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageMetaResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
}

impl From<Option<PageMeta>> for PageMetaResponse {
    fn from(meta: Option<PageMeta>) -> Self {
        match meta {
            Some(meta) => Self {
                page: Some(meta.page),
                per_page: Some(meta.per_page),
                total_pages: Some(meta.total_pages),
                total_items: Some(meta.total_items),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub meta: PageMetaResponse,
}

impl From<UserListing> for UserListResponse {
    fn from(listing: UserListing) -> Self {
        Self {
            items: listing.users.iter().map(UserResponse::from).collect(),
            meta: listing.meta.into(),
        }
    }
}

/// `{}`
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmptyResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_listing_has_empty_meta() {
        let json = serde_json::to_value(UserListResponse {
            items: vec![],
            meta: None.into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"items": [], "meta": {}}));
    }

    #[test]
    fn test_paged_listing_meta() {
        let meta = PageMeta {
            page: 2,
            per_page: 10,
            total_pages: 3,
            total_items: 25,
        };
        let json = serde_json::to_value(PageMetaResponse::from(Some(meta))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"page": 2, "per_page": 10, "total_pages": 3, "total_items": 25})
        );
    }

    #[test]
    fn test_create_user_is_admin_defaults_to_false() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"email":"a@example.com","password":"x"}"#).unwrap();
        assert!(!req.is_admin);
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(serde_json::to_string(&EmptyResponse {}).unwrap(), "{}");
    }
}

//! 인증 응답 DTO

use serde::{Deserialize, Serialize};

use crate::domain::models::token::TokenClaims;

/// `GET /auth/google/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleLoginUrlResponse {
    pub login_url: String,
    pub state: String,
}

/// `POST /auth/verify`
#[derive(Debug, Clone, Serialize)]
pub struct TokenVerificationResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: i64,
}

impl From<TokenClaims> for TokenVerificationResponse {
    fn from(claims: TokenClaims) -> Self {
        Self {
            valid: true,
            user_id: claims.sub,
            email: claims.email,
            roles: claims.roles,
            expires_at: claims.exp,
        }
    }
}

/// `POST /auth/logout-all`
#[derive(Debug, Clone, Serialize)]
pub struct RevokedSessionsResponse {
    pub revoked: u64,
}

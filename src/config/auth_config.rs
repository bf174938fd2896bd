//! # Authentication Configuration
//!
//! Google 로그인, 자체 발급 JWT, OAuth state 관련 설정을 환경 변수에서 읽습니다.
//!
//! ## 환경 변수
//!
//! ```bash
//! # Google (필수: GOOGLE_CLIENT_ID)
//! export GOOGLE_CLIENT_ID="1234-abc.apps.googleusercontent.com"
//! export GOOGLE_CLIENT_SECRET="..."          # authorization code 교환 시 필요
//! export GOOGLE_REDIRECT_URI="http://localhost:8080/api/v1/auth/google/callback"
//! export GOOGLE_CERTS_URL="https://www.googleapis.com/oauth2/v3/certs"
//!
//! # 자체 발급 토큰
//! export JWT_SECRET="change-me"
//! export JWT_ISSUER="auth-gateway"
//! export ACCESS_TOKEN_EXPIRE_MINUTES="30"
//! export REFRESH_TOKEN_EXPIRE_DAYS="7"
//!
//! # OAuth state
//! export OAUTH_STATE_SECRET="..."
//! export OAUTH_SESSION_TIMEOUT_MINUTES="10"
//! ```

use std::env;

use serde::{Deserialize, Serialize};

use crate::config::data_config::Environment;
use crate::core::errors::{AppError, AppResult};

const DEFAULT_JWT_SECRET: &str = "your-secret-key";
const DEFAULT_OAUTH_STATE_SECRET: &str = "oauth-state-secret";

/// Google ID 토큰의 `iss`로 허용되는 값
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

pub struct GoogleOAuthConfig;

impl GoogleOAuthConfig {
    /// ID 토큰의 `aud`와 비교되는 클라이언트 ID
    ///
    /// # Errors
    ///
    /// 설정되지 않았거나 비어 있으면 `AppError::InternalError`
    pub fn client_id() -> AppResult<String> {
        env::var("GOOGLE_CLIENT_ID")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::InternalError("GOOGLE_CLIENT_ID must be set".to_string()))
    }

    /// authorization code 교환에만 쓰이므로 선택 사항입니다.
    pub fn client_secret() -> Option<String> {
        env::var("GOOGLE_CLIENT_SECRET")
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    pub fn redirect_uri() -> String {
        env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| {
            "http://localhost:8080/api/v1/auth/google/callback".to_string()
        })
    }

    pub fn auth_uri() -> String {
        env::var("GOOGLE_AUTH_URI")
            .unwrap_or_else(|_| "https://accounts.google.com/o/oauth2/v2/auth".to_string())
    }

    pub fn token_uri() -> String {
        env::var("GOOGLE_TOKEN_URI")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/token".to_string())
    }

    /// Google 공개키(JWK Set) 엔드포인트
    pub fn certs_url() -> String {
        env::var("GOOGLE_CERTS_URL")
            .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v3/certs".to_string())
    }
}

pub struct JwtConfig;

impl JwtConfig {
    pub fn secret() -> String {
        env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, using default (not secure for production!)");
            DEFAULT_JWT_SECRET.to_string()
        })
    }

    /// 운영 환경에서 기본 시크릿으로 기동하는 것을 막습니다.
    pub fn ensure_secret_for(environment: &Environment) -> AppResult<()> {
        require_production_secret(
            "JWT_SECRET",
            environment,
            env::var("JWT_SECRET").ok().as_deref(),
            DEFAULT_JWT_SECRET,
        )
    }

    pub fn issuer() -> String {
        env::var("JWT_ISSUER").unwrap_or_else(|_| "auth-gateway".to_string())
    }

    pub fn access_token_expire_minutes() -> i64 {
        env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
            .ok()
            .and_then(|value| value.parse().ok())
            .filter(|minutes: &i64| *minutes > 0)
            .unwrap_or(30)
    }

    pub fn refresh_token_expire_days() -> i64 {
        env::var("REFRESH_TOKEN_EXPIRE_DAYS")
            .ok()
            .and_then(|value| value.parse().ok())
            .filter(|days: &i64| *days > 0)
            .unwrap_or(7)
    }
}

pub struct OAuthConfig;

impl OAuthConfig {
    pub fn state_secret() -> String {
        env::var("OAUTH_STATE_SECRET").unwrap_or_else(|_| {
            log::warn!("OAUTH_STATE_SECRET not set, using default (not secure for production!)");
            DEFAULT_OAUTH_STATE_SECRET.to_string()
        })
    }

    pub fn ensure_secret_for(environment: &Environment) -> AppResult<()> {
        require_production_secret(
            "OAUTH_STATE_SECRET",
            environment,
            env::var("OAUTH_STATE_SECRET").ok().as_deref(),
            DEFAULT_OAUTH_STATE_SECRET,
        )
    }

    pub fn session_timeout_minutes() -> i64 {
        env::var("OAUTH_SESSION_TIMEOUT_MINUTES")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(10)
    }
}

/// 운영 환경에서는 비어 있거나 공개된 기본값인 시크릿을 거부합니다.
fn require_production_secret(
    name: &str,
    environment: &Environment,
    configured: Option<&str>,
    default: &str,
) -> AppResult<()> {
    if !matches!(environment, Environment::Production) {
        return Ok(());
    }
    match configured.map(str::trim) {
        None | Some("") => Err(AppError::InternalError(format!(
            "{} must be set in production",
            name
        ))),
        Some(value) if value == default => Err(AppError::InternalError(format!(
            "{} must not use the default value in production",
            name
        ))),
        Some(_) => Ok(()),
    }
}

/// 계정이 어떤 방식으로 만들어졌는지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
}

//! 자체 발급 토큰 서비스
//!
//! - 액세스 토큰: HS256 JWT. 서버 상태 없이 서명과 `exp`만으로 검증됩니다.
//! - 리프레시 토큰: 32바이트 난수(base64url). 원문은 클라이언트만 가지고,
//!   저장소에는 SHA-256 해시만 남습니다. 한 번 교환하면 폐기됩니다.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::debug;
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::core::errors::{AppError, AppResult, ErrorContext};
use crate::core::registry::ServiceLocator;
use crate::domain::entities::users::user::User;
use crate::domain::models::token::{
    ACCESS_TOKEN_TYPE, RefreshTokenRecord, SessionCredential, TokenClaims,
};
use crate::repositories::tokens::RefreshTokenStore;

pub const BEARER_TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenSettings {
    pub fn from_env() -> Self {
        Self {
            secret: JwtConfig::secret(),
            issuer: JwtConfig::issuer(),
            access_ttl: Duration::minutes(JwtConfig::access_token_expire_minutes()),
            refresh_ttl: Duration::days(JwtConfig::refresh_token_expire_days()),
        }
    }
}

pub struct TokenService {
    settings: TokenSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    refresh_store: Arc<dyn RefreshTokenStore>,
}

/// 저장소 키로 쓰이는 리프레시 토큰 해시 (hex)
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// 32바이트 난수를 base64url(43자)로 인코딩한 불투명 토큰
fn generate_refresh_token_value() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

impl TokenService {
    pub fn new(settings: TokenSettings, refresh_store: Arc<dyn RefreshTokenStore>) -> Self {
        let encoding_key = EncodingKey::from_secret(settings.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(settings.secret.as_bytes());

        Self {
            settings,
            encoding_key,
            decoding_key,
            refresh_store,
        }
    }

    pub fn instance() -> AppResult<Arc<Self>> {
        ServiceLocator::get::<Self>()
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.settings.access_ttl.num_seconds()
    }

    pub fn generate_access_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user
                .id_string()
                .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?,
            email: Some(user.email.clone()),
            auth_provider: user.auth_provider,
            roles: user.roles.clone(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iss: self.settings.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + self.settings.access_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("JWT 토큰 생성 실패")
    }

    /// 액세스 토큰과 새 리프레시 토큰을 발급하고 리프레시 토큰을 저장합니다.
    pub async fn issue_session(&self, user: &User) -> AppResult<SessionCredential> {
        let user_id = user
            .id_string()
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;
        let access_token = self.generate_access_token(user)?;

        let refresh_token = generate_refresh_token_value();
        let now = Utc::now();
        let record = RefreshTokenRecord {
            token_hash: hash_refresh_token(&refresh_token),
            user_id,
            issued_at: now.timestamp(),
            expires_at: (now + self.settings.refresh_ttl).timestamp(),
        };
        self.refresh_store.save(&record).await?;

        Ok(SessionCredential {
            access_token,
            refresh_token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            expires_in: self.access_ttl_seconds(),
        })
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.settings.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::AuthenticationError("토큰이 만료되었습니다".to_string())
                }
                _ => {
                    debug!("액세스 토큰 검증 실패: {}", e);
                    AppError::AuthenticationError("유효하지 않은 토큰입니다".to_string())
                }
            })?;

        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::AuthenticationError("유효하지 않은 토큰입니다".to_string()));
        }
        Ok(claims)
    }

    /// 리프레시 토큰을 한 번만 사용할 수 있도록 꺼내면서 폐기합니다.
    ///
    /// # Errors
    ///
    /// 알 수 없거나, 이미 사용됐거나, 만료된 토큰이면 `AppError::AuthenticationError`
    pub async fn consume_refresh_token(&self, refresh_token: &str) -> AppResult<RefreshTokenRecord> {
        let invalid = || AppError::AuthenticationError("유효하지 않은 리프레시 토큰입니다".to_string());

        if refresh_token.trim().is_empty() {
            return Err(invalid());
        }

        let record = self
            .refresh_store
            .take(&hash_refresh_token(refresh_token))
            .await?
            .ok_or_else(invalid)?;

        if record.is_expired_at(Utc::now().timestamp()) {
            return Err(invalid());
        }
        Ok(record)
    }

    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> AppResult<bool> {
        self.refresh_store
            .revoke(&hash_refresh_token(refresh_token))
            .await
    }

    pub async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        self.refresh_store.revoke_all_for_user(user_id).await
    }

    pub fn extract_bearer_token(auth_header: &str) -> AppResult<&str> {
        auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::AuthenticationError("유효하지 않은 인증 헤더 형식입니다".to_string())
            })
    }
}

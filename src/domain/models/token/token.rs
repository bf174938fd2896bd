//! 자체 발급 토큰 모델

use serde::{Deserialize, Serialize};

use crate::config::AuthProvider;

pub const ACCESS_TOKEN_TYPE: &str = "access";

/// 액세스 토큰(JWT) 클레임
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// 사용자 ID (ObjectId hex)
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub auth_provider: AuthProvider,
    pub roles: Vec<String>,
    pub token_type: String,
    pub jti: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// 로그인/갱신 결과로 클라이언트에 내려주는 자격 증명 쌍
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCredential {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// 액세스 토큰 유효 시간 (초)
    pub expires_in: i64,
}

/// 저장소에 보관되는 리프레시 토큰 정보
///
/// 토큰 원문은 저장하지 않고 SHA-256 해시를 키로 사용합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

//! Google ID 토큰 클레임과 검증이 끝난 신원 정보

use serde::{Deserialize, Deserializer};

use crate::core::errors::AppError;

/// 서명 검증 후 디코딩되는 Google ID 토큰 페이로드
///
/// `iss`, `aud`, `exp` 는 `jsonwebtoken::Validation`이 검사하므로
/// 여기서는 신원 매핑에 필요한 필드만 다룹니다.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleIdTokenClaims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub email_verified: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

// 오래된 토큰은 email_verified 를 "true" 문자열로 보냅니다.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Text(text) => text.eq_ignore_ascii_case("true"),
    })
}

/// 검증이 끝난 Google 신원
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl TryFrom<GoogleIdTokenClaims> for GoogleIdentity {
    type Error = AppError;

    fn try_from(claims: GoogleIdTokenClaims) -> Result<Self, Self::Error> {
        if claims.sub.trim().is_empty() {
            return Err(AppError::AuthenticationError(
                "Google ID token has no subject".to_string(),
            ));
        }

        let email = claims
            .email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .ok_or_else(|| {
                AppError::ValidationError("Google account did not share an email address".to_string())
            })?;

        Ok(Self {
            subject: claims.sub,
            email,
            email_verified: claims.email_verified,
            name: claims.name.filter(|name| !name.trim().is_empty()),
            picture: claims.picture,
        })
    }
}

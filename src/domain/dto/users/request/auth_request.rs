//! 인증 요청 DTO
//!
//! 로그인/토큰 갱신/로그아웃 요청 본문과 OAuth 콜백 쿼리를 매핑합니다.

use serde::Deserialize;
use validator::Validate;

/// `POST /auth/google-login`
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleLoginRequest {
    #[validate(length(min = 1, message = "id_token이 필요합니다"))]
    pub id_token: String,
}

/// `POST /auth/refresh`, `POST /auth/logout`
///
/// 본문이 없으면 `refresh_token` 쿠키를 사용합니다.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "리프레시 토큰이 필요합니다"))]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LocalLoginRequest {
    #[validate(email(message = "유효한 이메일 주소를 입력해주세요"))]
    pub email: String,

    #[validate(length(min = 1, message = "비밀번호를 입력해주세요"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "유효한 이메일 주소를 입력해주세요"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "비밀번호는 8자 이상 128자 이하여야 합니다"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "이름은 1자 이상 100자 이하여야 합니다"))]
    pub name: Option<String>,
}

/// `GET /auth/google/callback`
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_id_token_is_invalid() {
        let request = GoogleLoginRequest { id_token: String::new() };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_register_requires_reasonable_password() {
        let request = RegisterRequest {
            email: "learner@example.com".to_string(),
            password: "short".to_string(),
            name: None,
        };
        assert!(request.validate().is_err());

        let request = RegisterRequest {
            password: "long-enough-password".to_string(),
            ..request
        };
        assert!(request.validate().is_ok());
    }
}

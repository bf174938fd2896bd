//! 애플리케이션 전역에서 사용하는 에러 시스템
//!
//! `thiserror`로 정의한 [`AppError`] 하나로 모든 계층의 실패를 표현하고,
//! `actix_web::ResponseError` 구현을 통해 일관된 JSON 에러 응답으로 변환합니다.
//!
//! ## 응답 형식
//!
//! ```json
//! {
//!   "error": {
//!     "code": "AUTHENTICATION_FAILED",
//!     "message": "Invalid Google ID token",
//!     "status": 401
//!   }
//! }
//! ```
//!
//! 401 응답에는 `WWW-Authenticate: Bearer` 헤더가 붙습니다.
//! 5xx 에러의 내부 메시지는 로그로만 남기고 클라이언트에는 일반 메시지를 돌려줍니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::core::errors::{AppError, AppResult};
//!
//! async fn find_user(id: &str) -> AppResult<User> {
//!     user_store.find_by_id(id).await?
//!         .ok_or_else(|| AppError::NotFound("User not found".to_string()))
//! }
//! ```

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

/// 애플리케이션 전역 에러 타입
#[derive(Error, Debug)]
pub enum AppError {
    /// 데이터베이스 관련 에러 (500)
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Redis 관련 에러 (500)
    #[error("Redis error: {0}")]
    RedisError(String),

    /// 입력값 검증 에러 (400)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 리소스 없음 (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 충돌/중복 (409)
    #[error("Conflict error: {0}")]
    ConflictError(String),

    /// 인증 실패 (401)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// 권한 부족 (403)
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Google 등 외부 서비스 호출 실패 (502)
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 내부 서버 에러 (500)
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 클라이언트에 노출되는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::RedisError(_) => "CACHE_ERROR",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ConflictError(_) => "CONFLICT",
            AppError::AuthenticationError(_) => "AUTHENTICATION_FAILED",
            AppError::AuthorizationError(_) => "FORBIDDEN",
            AppError::ExternalServiceError(_) => "UPSTREAM_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 클라이언트에 노출해도 되는 메시지
    ///
    /// 서버 측 에러는 내부 정보가 섞여 있으므로 일반 문구로 대체합니다.
    fn public_message(&self) -> String {
        match self {
            AppError::DatabaseError(_) | AppError::RedisError(_) | AppError::InternalError(_) => {
                "Internal server error".to_string()
            }
            AppError::ExternalServiceError(_) => "Upstream service unavailable".to_string(),
            AppError::ValidationError(msg)
            | AppError::NotFound(msg)
            | AppError::ConflictError(msg)
            | AppError::AuthenticationError(msg)
            | AppError::AuthorizationError(msg) => msg.clone(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            error!("❌ {}", self);
        }

        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }

        builder.json(serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
                "status": status.as_u16(),
            }
        }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// 편의성을 위한 Result 타입 별칭
pub type AppResult<T> = Result<T, AppError>;

/// 외부 라이브러리 에러를 AppError로 변환하는 확장 trait
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> AppResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InternalError(format!("{}: {}", msg, e)))
    }
}

//! 미들웨어 모듈
//!
//! # 제공 미들웨어
//!
//! ### 인증 미들웨어 (AuthMiddleware)
//! - Bearer 액세스 토큰 검증 (서명, 만료, `token_type`)
//! - 사용자 정보를 request extension에 저장
//! - 선택적/강제 인증 모드, 역할 요구사항 지원
//!
//! ### 보안 헤더 (security_headers)
//! - nosniff, DENY, XSS, HSTS, no-referrer, no-store/no-cache
//!
//! ## 특정 스코프에만 적용
//! ```rust,ignore
//! use actix_web::web;
//!
//! web::scope("/api/v1/users")
//!     .wrap(AuthMiddleware::required())
//!     .service(handlers::users::get_me)
//! ```

pub mod auth_middleware;
mod auth_inner;
pub mod security_headers;

pub use auth_middleware::{AuthMiddleware, AuthMode, RequiredRole};
pub use security_headers::security_headers;

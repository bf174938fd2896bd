//! # HTTP Request Handlers Module
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//!   Client (Browser, Mobile App)
//! └─────────────────────┬───────────────────────┘
//!                       │ HTTP Request/Response
//! ┌─────────────────────▼───────────────────────┐
//!   Handlers (이 모듈)               ← Web Layer
//! ├─────────────────────────────────────────────┤
//!   Services                         ← Service Layer
//! ├─────────────────────────────────────────────┤
//!   UserStore / RefreshTokenStore    ← Repository Layer
//! └─────────────────────────────────────────────┘
//! ```
//!
//! 핸들러는 입력 검증(`validator`)과 서비스 호출만 합니다. 실패는 모두
//! [`AppError`](crate::core::errors::AppError)로 반환하며, `ResponseError` 구현이
//! `{"error": {"code", "message", "status"}}` 형태의 응답으로 바꿉니다.

pub mod auth;
pub mod users;

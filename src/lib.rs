//! Google 로그인 인증 게이트웨이
//!
//! 프론트엔드가 받은 Google ID 토큰을 검증하고, 검증된 신원마다 사용자 하나를
//! 유지하며, 자체 액세스/리프레시 토큰을 발급합니다.
//!
//! # Features
//!
//! - **Google 로그인**: ID 토큰 검증 (JWKS 캐시), Authorization Code Flow
//! - **토큰**: HS256 액세스 토큰, 1회용 리프레시 토큰 (Redis, SHA-256 키)
//! - **로컬 계정**: bcrypt 비밀번호 로그인
//! - **사용자 관리**: 프로필, 경험치/레벨, 게임 횟수
//! - **저장소**: MongoDB + Redis 캐시, 또는 개발용 메모리 저장소
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP Routes   │ ← REST API 엔드포인트, AuthMiddleware
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Handlers     │ ← 요청 검증, 응답 변환
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Services     │ ← GoogleAuthService, SessionService, TokenService, UserService
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Repositories   │ ← UserStore / RefreshTokenStore trait
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ MongoDB + Redis │ ← 저장소
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use auth_gateway_backend::services::auth::GoogleAuthService;
//!
//! let google_auth = GoogleAuthService::instance()?;
//! let credential = google_auth.google_login(&id_token).await?;
//! println!("{}", credential.access_token);
//! ```

pub mod caching;
pub mod config;
pub mod core;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod middlewares;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

#[cfg(test)]
pub mod test_support;

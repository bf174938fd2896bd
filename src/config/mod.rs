//! # Configuration
//!
//! 환경 변수 기반 설정입니다. `.env.dev` / `.env.prod` 파일은 `main`에서
//! `PROFILE` 값에 따라 로드됩니다.

pub mod auth_config;
pub mod data_config;

pub use auth_config::*;
pub use data_config::*;

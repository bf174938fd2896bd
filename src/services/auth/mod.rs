//! 인증 서비스 모듈
//!
//! - [`GoogleIdTokenVerifier`]: Google ID 토큰 서명/클레임 검증 (JWKS 캐시)
//! - [`GoogleAuthService`]: Google 로그인 (ID 토큰, Authorization Code Flow)
//! - [`TokenService`]: 자체 액세스/리프레시 토큰 발급 및 검증
//! - [`SessionService`]: 리프레시 토큰 교환, 로그아웃
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::services::auth::GoogleAuthService;
//!
//! let google_auth = GoogleAuthService::instance()?;
//! let credential = google_auth.google_login(&request.id_token).await?;
//! ```

pub mod google_auth_service;
pub mod google_token_verifier;
pub mod session_service;
pub mod token_service;

pub use google_auth_service::*;
pub use google_token_verifier::*;
pub use session_service::*;
pub use token_service::*;

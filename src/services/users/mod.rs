//! 사용자 관리 서비스 모듈
//!
//! 로컬 계정 등록/로그인과 프로필, 학습 진행도(XP, 레벨, 게임 횟수) 관리를 담당합니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::services::users::UserService;
//!
//! let user_service = UserService::instance()?;
//! let user = user_service.get_user_by_id(&auth_user.user_id).await?;
//! ```

pub mod user_service;

pub use user_service::*;

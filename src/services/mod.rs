//! 비즈니스 로직을 담당하는 서비스 계층 모듈
//!
//! 각 서비스는 저장소 trait(`UserStore`, `RefreshTokenStore`)와 검증기 trait
//! (`IdTokenVerifier`)에만 의존합니다. 서버 기동 시 `main`에서 구현체를 골라
//! [`ServiceLocator`](crate::core::registry::ServiceLocator)에 등록하고,
//! 핸들러는 `instance()`로 꺼내 씁니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use crate::services::{auth::TokenService, users::UserService};
//!
//! let user_service = UserService::instance()?;
//! let token_service = TokenService::instance()?;
//! ```

pub mod auth;
pub mod users;

use std::sync::Arc;

use crate::core::errors::AppResult;
use crate::core::registry::ServiceLocator;
use crate::repositories::tokens::RefreshTokenStore;
use crate::repositories::users::UserStore;
use auth::{
    GoogleAuthService, GoogleOAuthSettings, IdTokenVerifier, SessionService, TokenService,
    TokenSettings,
};
use users::UserService;

/// 서비스 계층이 필요로 하는 외부 구현체와 설정
pub struct ServiceDependencies {
    pub user_store: Arc<dyn UserStore>,
    pub refresh_store: Arc<dyn RefreshTokenStore>,
    pub verifier: Arc<dyn IdTokenVerifier>,
    pub token_settings: TokenSettings,
    pub oauth_settings: GoogleOAuthSettings,
    pub bcrypt_cost: u32,
}

/// 모든 서비스를 생성해 [`ServiceLocator`]에 등록합니다.
pub fn register_services(deps: ServiceDependencies) -> AppResult<()> {
    let token_service = Arc::new(TokenService::new(deps.token_settings, deps.refresh_store));

    ServiceLocator::set(Arc::new(GoogleAuthService::new(
        deps.user_store.clone(),
        deps.verifier,
        token_service.clone(),
        deps.oauth_settings,
    )?));
    ServiceLocator::set(Arc::new(SessionService::new(
        deps.user_store.clone(),
        token_service.clone(),
    )));
    ServiceLocator::set(Arc::new(UserService::new(
        deps.user_store,
        token_service.clone(),
        deps.bcrypt_cost,
    )));
    ServiceLocator::set(token_service);
    Ok(())
}

//! 세션 갱신 및 로그아웃
//!
//! 리프레시 토큰은 1회용입니다. 교환하는 순간 저장소에서 꺼내지며(`GETDEL`),
//! 같은 토큰을 다시 내밀면 401이 반환됩니다.

use std::sync::Arc;

use log::{info, warn};

use crate::core::errors::{AppError, AppResult};
use crate::core::registry::ServiceLocator;
use crate::domain::models::token::SessionCredential;
use crate::repositories::users::UserStore;
use crate::services::auth::token_service::TokenService;

pub struct SessionService {
    user_store: Arc<dyn UserStore>,
    token_service: Arc<TokenService>,
}

impl SessionService {
    pub fn new(user_store: Arc<dyn UserStore>, token_service: Arc<TokenService>) -> Self {
        Self {
            user_store,
            token_service,
        }
    }

    pub fn instance() -> AppResult<Arc<Self>> {
        ServiceLocator::get::<Self>()
    }

    /// 리프레시 토큰을 소비하고 새 자격 증명 쌍을 발급합니다.
    ///
    /// # Errors
    ///
    /// - 알 수 없음/이미 사용됨/만료: `AppError::AuthenticationError`
    /// - 사용자가 삭제되었거나 비활성: `AppError::AuthenticationError`
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<SessionCredential> {
        let record = self.token_service.consume_refresh_token(refresh_token).await?;

        let user = self
            .user_store
            .find_by_id(&record.user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| {
                warn!("🚫 리프레시 대상 사용자가 없거나 비활성: {}", record.user_id);
                AppError::AuthenticationError("유효하지 않은 리프레시 토큰입니다".to_string())
            })?;

        let credential = self.token_service.issue_session(&user).await?;
        info!("🔄 세션 갱신: {}", record.user_id);
        Ok(credential)
    }

    /// 리프레시 토큰 하나를 폐기합니다. 이미 없는 토큰이어도 성공으로 봅니다.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        if self.token_service.revoke_refresh_token(refresh_token).await? {
            info!("👋 로그아웃 처리 완료");
        }
        Ok(())
    }

    pub async fn logout_all(&self, user_id: &str) -> AppResult<u64> {
        let revoked = self.token_service.revoke_all_for_user(user_id).await?;
        info!("👋 전체 로그아웃: {} ({}개 세션)", user_id, revoked);
        Ok(revoked)
    }
}

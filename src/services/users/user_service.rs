//! # 사용자 관리 서비스
//!
//! 로컬(이메일/비밀번호) 계정의 등록과 로그인, 그리고 인증된 사용자의
//! 프로필/학습 진행도 관리를 담당합니다.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       UserService                        │
//! ├──────────────────┬──────────────────┬────────────────────┤
//! │  Registration    │  Authentication  │  Profile / Stats   │
//! │  • 중복 이메일   │  • bcrypt 검증   │  • 이름, 이미지    │
//! │  • bcrypt 해싱   │  • Google 전용   │  • XP, 레벨        │
//! │                  │    계정 차단     │  • 게임 횟수       │
//! └──────────────────┴──────────────────┴────────────────────┘
//!                             │
//!                             ▼
//!                   dyn UserStore (MongoDB + Redis 캐시 / 메모리)
//! ```
//!
//! ## 비밀번호 보안
//!
//! - bcrypt cost는 환경별로 다릅니다 (`PasswordConfig::bcrypt_cost`).
//! - 이메일이 없거나 비밀번호가 틀린 경우 같은 메시지를 돌려줍니다.

use std::sync::Arc;

use bcrypt::hash;
use log::{debug, info};

use crate::core::errors::{AppError, AppResult};
use crate::core::registry::ServiceLocator;
use crate::domain::dto::users::request::{ListUsersQuery, RegisterRequest, UpdateUserRequest};
use crate::domain::dto::users::response::{UserListResponse, UserResponse};
use crate::domain::entities::users::user::User;
use crate::domain::models::token::SessionCredential;
use crate::repositories::users::{ProfileUpdate, UserStore};
use crate::services::auth::token_service::TokenService;

const INVALID_CREDENTIALS: &str = "잘못된 이메일 또는 비밀번호입니다";

fn not_found() -> AppError {
    AppError::NotFound("사용자를 찾을 수 없습니다".to_string())
}

pub struct UserService {
    user_store: Arc<dyn UserStore>,
    token_service: Arc<TokenService>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(user_store: Arc<dyn UserStore>, token_service: Arc<TokenService>, bcrypt_cost: u32) -> Self {
        Self {
            user_store,
            token_service,
            bcrypt_cost,
        }
    }

    pub fn instance() -> AppResult<Arc<Self>> {
        ServiceLocator::get::<Self>()
    }

    /// 로컬 계정 등록
    ///
    /// # Errors
    ///
    /// * `AppError::ConflictError` - 이미 사용 중인 이메일
    /// * `AppError::InternalError` - 비밀번호 해싱 실패
    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserResponse> {
        let email = request.email.trim().to_lowercase();

        if self.user_store.find_by_email(&email).await?.is_some() {
            return Err(AppError::ConflictError("이미 사용 중인 이메일입니다".to_string()));
        }

        let hash_start = std::time::Instant::now();
        let password_hash = hash(&request.password, self.bcrypt_cost)
            .map_err(|e| AppError::InternalError(format!("비밀번호 해싱 실패: {}", e)))?;
        debug!("Password hashing took: {:?}", hash_start.elapsed());

        let name = request.name.map(|name| name.trim().to_string());
        let created = self
            .user_store
            .insert(User::new_local(email, name, password_hash))
            .await?;

        info!("🆕 로컬 계정 생성: {}", created.email);
        Ok(UserResponse::from(created))
    }

    /// 이메일/비밀번호 로그인 후 자격 증명을 발급합니다.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<SessionCredential> {
        let user = self.verify_password(email, password).await?;

        let user_id = user
            .id_string()
            .ok_or_else(|| AppError::InternalError("저장된 사용자에 ID가 없습니다".to_string()))?;
        self.user_store.record_login(&user_id).await?;

        let credential = self.token_service.issue_session(&user).await?;
        info!("✅ 로컬 로그인 성공: {}", user.email);
        Ok(credential)
    }

    /// 비밀번호를 검증하고 사용자를 돌려줍니다.
    ///
    /// Google 로그인으로만 만들어진 계정은 비밀번호가 없으므로 항상 실패하며,
    /// 계정 존재 여부가 드러나지 않도록 같은 메시지를 씁니다.
    pub async fn verify_password(&self, email: &str, password: &str) -> AppResult<User> {
        let email = email.trim().to_lowercase();
        let user = self
            .user_store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::AuthenticationError(INVALID_CREDENTIALS.to_string()))?;

        let password_hash = user
            .password_hash
            .as_deref()
            .ok_or_else(|| AppError::AuthenticationError(INVALID_CREDENTIALS.to_string()))?;

        let is_valid = bcrypt::verify(password, password_hash)
            .map_err(|e| AppError::InternalError(format!("비밀번호 검증 실패: {}", e)))?;
        if !is_valid {
            return Err(AppError::AuthenticationError(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            return Err(AppError::AuthenticationError("비활성화된 계정입니다".to_string()));
        }

        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &str) -> AppResult<UserResponse> {
        let user = self.user_store.find_by_id(id).await?.ok_or_else(not_found)?;
        Ok(UserResponse::from(user))
    }

    pub async fn get_user_by_email(&self, email: &str) -> AppResult<UserResponse> {
        let user = self
            .user_store
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(not_found)?;
        Ok(UserResponse::from(user))
    }

    pub async fn update_profile(&self, id: &str, request: UpdateUserRequest) -> AppResult<UserResponse> {
        if request.is_empty() {
            return Err(AppError::ValidationError("변경할 항목이 없습니다".to_string()));
        }

        let update = ProfileUpdate {
            display_name: request.name.map(|name| name.trim().to_string()),
            profile_image_url: request.image,
        };

        let user = self
            .user_store
            .update_profile(id, &update)
            .await?
            .ok_or_else(not_found)?;
        Ok(UserResponse::from(user))
    }

    pub async fn add_xp(&self, id: &str, amount: i64) -> AppResult<UserResponse> {
        if amount <= 0 {
            return Err(AppError::ValidationError("xp_increase는 양수여야 합니다".to_string()));
        }

        let user = self.user_store.add_xp(id, amount).await?.ok_or_else(not_found)?;
        debug!("⭐ XP +{} → {} (level {})", amount, user.xp_points, user.level);
        Ok(UserResponse::from(user))
    }

    pub async fn record_game_played(&self, id: &str) -> AppResult<UserResponse> {
        let user = self
            .user_store
            .increment_games_played(id)
            .await?
            .ok_or_else(not_found)?;
        Ok(UserResponse::from(user))
    }

    /// 계정을 삭제하고 남아 있는 리프레시 토큰도 모두 폐기합니다.
    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        if !self.user_store.delete(id).await? {
            return Err(not_found());
        }

        self.token_service.revoke_all_for_user(id).await?;
        info!("🗑️ 사용자 삭제: {}", id);
        Ok(())
    }

    /// ID 순 페이지 조회. 한 페이지가 가득 찼을 때만 `last_evaluated_key`를 채웁니다.
    pub async fn list_users(&self, query: &ListUsersQuery) -> AppResult<UserListResponse> {
        let limit = query.page_size();
        let users = self
            .user_store
            .list(limit, query.last_key.as_deref())
            .await?;

        let last_evaluated_key = if users.len() as i64 == limit {
            users.last().and_then(User::id_string)
        } else {
            None
        };

        let items: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
        Ok(UserListResponse {
            count: items.len(),
            items,
            last_evaluated_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::oauth::GoogleIdentity;
    use crate::repositories::tokens::InMemoryRefreshTokenStore;
    use crate::repositories::users::InMemoryUserStore;
    use crate::services::auth::token_service::TokenSettings;
    use chrono::Duration;

    struct Fixture {
        users: Arc<InMemoryUserStore>,
        refresh_store: Arc<InMemoryRefreshTokenStore>,
        service: UserService,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let refresh_store = Arc::new(InMemoryRefreshTokenStore::new());
        let tokens = Arc::new(TokenService::new(
            TokenSettings {
                secret: "user-service-test".to_string(),
                issuer: "auth-gateway-test".to_string(),
                access_ttl: Duration::minutes(30),
                refresh_ttl: Duration::days(7),
            },
            refresh_store.clone(),
        ));
        // bcrypt 최소 cost
        let service = UserService::new(users.clone(), tokens, 4);
        Fixture { users, refresh_store, service }
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "correct-horse-battery".to_string(),
            name: Some(" Learner ".to_string()),
        }
    }

    #[actix_web::test]
    async fn test_register_then_login() {
        let fx = fixture();
        let created = fx.service.register(register_request("Local@Example.com")).await.unwrap();
        assert_eq!(created.email, "local@example.com");
        assert_eq!(created.name.as_deref(), Some("Learner"));

        let credential = fx
            .service
            .login("local@example.com", "correct-horse-battery")
            .await
            .unwrap();
        assert_eq!(fx.refresh_store.active_count_for(&created.id), 1);
        assert!(!credential.access_token.is_empty());

        let stored = fx.users.find_by_email("local@example.com").await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[actix_web::test]
    async fn test_duplicate_registration_conflicts() {
        let fx = fixture();
        fx.service.register(register_request("dup@example.com")).await.unwrap();

        assert!(matches!(
            fx.service.register(register_request("DUP@example.com")).await,
            Err(AppError::ConflictError(_))
        ));
    }

    #[actix_web::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let fx = fixture();
        fx.service.register(register_request("pw@example.com")).await.unwrap();

        let wrong = fx.service.login("pw@example.com", "nope-nope-nope").await.unwrap_err();
        let unknown = fx.service.login("who@example.com", "nope-nope-nope").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[actix_web::test]
    async fn test_google_only_account_cannot_use_password() {
        let fx = fixture();
        fx.users
            .upsert_google_user(&GoogleIdentity {
                subject: "sub-1".to_string(),
                email: "google@example.com".to_string(),
                email_verified: true,
                name: None,
                picture: None,
            })
            .await
            .unwrap();

        let google_only = fx.service.login("google@example.com", "anything-at-all").await.unwrap_err();
        assert!(matches!(google_only, AppError::AuthenticationError(_)));

        let unknown = fx.service.login("nobody@example.com", "anything-at-all").await.unwrap_err();
        assert_eq!(google_only.to_string(), unknown.to_string());
    }

    #[actix_web::test]
    async fn test_xp_and_games_played() {
        let fx = fixture();
        let created = fx.service.register(register_request("xp@example.com")).await.unwrap();

        let updated = fx.service.add_xp(&created.id, 250).await.unwrap();
        assert_eq!(updated.xp_points, 250);
        assert_eq!(updated.level, 3);

        assert!(matches!(
            fx.service.add_xp(&created.id, 0).await,
            Err(AppError::ValidationError(_))
        ));

        fx.service.record_game_played(&created.id).await.unwrap();
        let updated = fx.service.record_game_played(&created.id).await.unwrap();
        assert_eq!(updated.games_played, 2);
    }

    #[actix_web::test]
    async fn test_update_profile_requires_a_field() {
        let fx = fixture();
        let created = fx.service.register(register_request("profile@example.com")).await.unwrap();

        assert!(matches!(
            fx.service.update_profile(&created.id, UpdateUserRequest::default()).await,
            Err(AppError::ValidationError(_))
        ));

        let updated = fx
            .service
            .update_profile(
                &created.id,
                UpdateUserRequest {
                    name: Some("Renamed".to_string()),
                    image: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Renamed"));
    }

    #[actix_web::test]
    async fn test_delete_user_revokes_sessions() {
        let fx = fixture();
        let created = fx.service.register(register_request("del@example.com")).await.unwrap();
        fx.service.login("del@example.com", "correct-horse-battery").await.unwrap();

        fx.service.delete_user(&created.id).await.unwrap();

        assert_eq!(fx.refresh_store.active_count_for(&created.id), 0);
        assert!(matches!(
            fx.service.get_user_by_id(&created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.delete_user(&created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_list_users_paginates() {
        let fx = fixture();
        for i in 0..3 {
            fx.service
                .register(register_request(&format!("page{}@example.com", i)))
                .await
                .unwrap();
        }

        let first = fx
            .service
            .list_users(&ListUsersQuery { limit: Some(2), last_key: None })
            .await
            .unwrap();
        assert_eq!(first.count, 2);
        assert!(first.last_evaluated_key.is_some());

        let second = fx
            .service
            .list_users(&ListUsersQuery { limit: Some(2), last_key: first.last_evaluated_key })
            .await
            .unwrap();
        assert_eq!(second.count, 1);
        assert!(second.last_evaluated_key.is_none());
    }
}

//! 사용자 저장소 추상화
//!
//! 서비스 계층은 [`UserStore`] trait만 바라봅니다. 운영 환경에서는 MongoDB 기반
//! [`UserRepository`](super::user_repo::UserRepository)를,
//! `STORAGE_BACKEND=memory` 개발 모드와 테스트에서는 [`InMemoryUserStore`]를 씁니다.
//!
//! 두 구현 모두 다음을 보장합니다.
//!
//! - Google `sub` 하나당 사용자 하나 (동시 첫 로그인 포함)
//! - 이메일은 사용자 간 유일

use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::DateTime;
use mongodb::bson::oid::ObjectId;

use crate::core::errors::{AppError, AppResult};
use crate::domain::entities::users::user::User;
use crate::domain::models::oauth::GoogleIdentity;

/// 프로필 부분 수정 내용. `None` 필드는 변경하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 검증된 Google 신원에 해당하는 사용자를 찾아 갱신하거나 새로 만듭니다.
    ///
    /// 1. `google_sub`가 같은 사용자 → 프로필/로그인 시각 갱신
    /// 2. Google이 검증한 이메일과 같은, 아직 연결되지 않은 사용자 → 연결 후 갱신
    /// 3. 없으면 생성
    ///
    /// # Errors
    ///
    /// 이메일이 다른 Google 계정에 이미 연결돼 있으면 `AppError::ConflictError`
    async fn upsert_google_user(&self, identity: &GoogleIdentity) -> AppResult<User>;

    /// # Errors
    ///
    /// 이메일 중복이면 `AppError::ConflictError`
    async fn insert(&self, user: User) -> AppResult<User>;

    async fn record_login(&self, id: &str) -> AppResult<()>;

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> AppResult<Option<User>>;

    async fn add_xp(&self, id: &str, amount: i64) -> AppResult<Option<User>>;

    async fn increment_games_played(&self, id: &str) -> AppResult<Option<User>>;

    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// `_id` 오름차순으로 `after` 다음부터 최대 `limit`명
    async fn list(&self, limit: i64, after: Option<&str>) -> AppResult<Vec<User>>;
}

pub fn parse_user_id(id: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| AppError::ValidationError("유효하지 않은 ID 형식입니다".to_string()))
}

pub fn email_conflict() -> AppError {
    AppError::ConflictError("Email is already registered to another account".to_string())
}

/// 프로세스 메모리에 사용자를 보관하는 저장소
///
/// 하나의 뮤텍스 안에서 조회와 삽입을 함께 수행하므로 create-if-absent가 원자적입니다.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn modify<F>(&self, id: &str, change: F) -> AppResult<Option<User>>
    where
        F: FnOnce(&mut User),
    {
        let object_id = parse_user_id(id)?;
        let mut users = self.lock();

        Ok(users.iter_mut().find(|user| user.id == Some(object_id)).map(|user| {
            change(user);
            user.clone()
        }))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let object_id = parse_user_id(id)?;
        Ok(self.lock().iter().find(|user| user.id == Some(object_id)).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.lock().iter().find(|user| user.email == email).cloned())
    }

    async fn upsert_google_user(&self, identity: &GoogleIdentity) -> AppResult<User> {
        let mut users = self.lock();

        let existing = users
            .iter()
            .position(|user| user.google_sub.as_deref() == Some(identity.subject.as_str()))
            .or_else(|| {
                users.iter().position(|user| {
                    identity.email_verified && user.google_sub.is_none() && user.email == identity.email
                })
            });

        if let Some(index) = existing {
            let user = &mut users[index];
            user.apply_google_login(identity);
            return Ok(user.clone());
        }

        if users.iter().any(|user| user.email == identity.email) {
            return Err(email_conflict());
        }

        let mut user = User::new_google(identity);
        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn insert(&self, mut user: User) -> AppResult<User> {
        let mut users = self.lock();
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(email_conflict());
        }

        user.id = Some(ObjectId::new());
        users.push(user.clone());
        Ok(user)
    }

    async fn record_login(&self, id: &str) -> AppResult<()> {
        self.modify(id, |user| {
            let now = DateTime::now();
            user.last_login_at = Some(now);
            user.updated_at = now;
        })?;
        Ok(())
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> AppResult<Option<User>> {
        self.modify(id, |user| {
            if let Some(name) = &update.display_name {
                user.display_name = Some(name.clone());
            }
            if let Some(image) = &update.profile_image_url {
                user.profile_image_url = Some(image.clone());
            }
            user.updated_at = DateTime::now();
        })
    }

    async fn add_xp(&self, id: &str, amount: i64) -> AppResult<Option<User>> {
        self.modify(id, |user| user.add_xp(amount))
    }

    async fn increment_games_played(&self, id: &str) -> AppResult<Option<User>> {
        self.modify(id, User::record_game_played)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let object_id = parse_user_id(id)?;
        let mut users = self.lock();
        let before = users.len();
        users.retain(|user| user.id != Some(object_id));
        Ok(users.len() < before)
    }

    async fn list(&self, limit: i64, after: Option<&str>) -> AppResult<Vec<User>> {
        let after = after.map(parse_user_id).transpose()?;
        let mut users: Vec<User> = self
            .lock()
            .iter()
            .filter(|user| match (after, user.id) {
                (Some(after), Some(id)) => id > after,
                _ => true,
            })
            .cloned()
            .collect();

        users.sort_by_key(|user| user.id);
        users.truncate(limit.max(0) as usize);
        Ok(users)
    }
}

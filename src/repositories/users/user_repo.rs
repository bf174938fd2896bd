//! # 사용자 리포지토리 (MongoDB)
//!
//! [`UserStore`]의 운영 구현입니다. MongoDB를 주 저장소로, Redis를 ID 조회 캐시로 씁니다.
//!
//! ## 인덱스
//!
//! | 이름 | 키 | 옵션 |
//! |------|----|------|
//! | `email_unique` | `email` | unique |
//! | `google_sub_unique` | `google_sub` | unique, sparse |
//! | `created_at_desc` | `created_at` | |
//!
//! ## 동시 첫 로그인
//!
//! 생성은 `google_sub` 필터 + `upsert(true)` 한 번의 `findOneAndUpdate`로 수행합니다.
//! 두 요청이 동시에 삽입을 시도하면 unique 인덱스가 한쪽을 E11000으로 거절하고,
//! 거절된 쪽은 처음부터 다시 조회하여 이미 만들어진 사용자를 돌려받습니다.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use futures_util::future::LocalBoxFuture;
use log::{debug, info, warn};
use mongodb::bson::{self, DateTime, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Collection, IndexModel};

use crate::caching::redis::RedisClient;
use crate::config::CacheConfig;
use crate::core::errors::{AppError, AppResult};
use crate::core::registry::{RepositoryRegistration, ServiceLocator};
use crate::db::Database;
use crate::domain::entities::users::user::User;
use crate::domain::models::oauth::GoogleIdentity;
use crate::repositories::users::user_store::{
    ProfileUpdate, UserStore, email_conflict, parse_user_id,
};

pub const USERS_COLLECTION: &str = "users";

const DUPLICATE_KEY: i32 = 11000;
const UPSERT_ATTEMPTS: u32 = 2;

pub struct UserRepository {
    db: Arc<Database>,
    redis: Arc<RedisClient>,
}

fn database_error(e: mongodb::error::Error) -> AppError {
    AppError::DatabaseError(e.to_string())
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

/// 로그인할 때마다 덮어쓰는 필드
fn google_login_fields(identity: &GoogleIdentity, now: DateTime) -> Document {
    let mut fields = doc! {
        "last_login_at": now,
        "updated_at": now,
    };
    if let Some(name) = &identity.name {
        fields.insert("display_name", name.clone());
    }
    if let Some(picture) = &identity.picture {
        fields.insert("profile_image_url", picture.clone());
    }
    if identity.email_verified {
        fields.insert("is_email_verified", true);
    }
    fields
}

impl UserRepository {
    pub fn new(db: Arc<Database>, redis: Arc<RedisClient>) -> Self {
        Self { db, redis }
    }

    pub fn instance() -> AppResult<Arc<Self>> {
        ServiceLocator::get::<Self>()
    }

    fn collection(&self) -> Collection<User> {
        self.db.collection::<User>(USERS_COLLECTION)
    }

    fn cache_key(id: &str) -> String {
        format!("user:id:{}", id)
    }

    async fn invalidate_cache(&self, id: &str) {
        if let Err(e) = self.redis.del(&Self::cache_key(id)).await {
            warn!("⚠️ 사용자 캐시 무효화 실패 ({}): {}", id, e);
        }
    }

    async fn after_write(&self, user: Option<User>) -> Option<User> {
        if let Some(id) = user.as_ref().and_then(User::id_string) {
            self.invalidate_cache(&id).await;
        }
        user
    }

    pub async fn create_indexes(&self) -> AppResult<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).name("email_unique".to_string()).build())
            .build();

        let google_sub_index = IndexModel::builder()
            .keys(doc! { "google_sub": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .name("google_sub_unique".to_string())
                    .build(),
            )
            .build();

        let created_at_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(IndexOptions::builder().name("created_at_desc".to_string()).build())
            .build();

        self.collection()
            .create_indexes([email_index, google_sub_index, created_at_index])
            .await
            .map_err(database_error)?;

        info!("✅ users 인덱스 확인 완료");
        Ok(())
    }

    async fn try_upsert_google_user(
        &self,
        identity: &GoogleIdentity,
        login_fields: &Document,
        insert_fields: &Document,
    ) -> Result<Option<User>, mongodb::error::Error> {
        let collection = self.collection();

        let existing = collection
            .find_one_and_update(
                doc! { "google_sub": identity.subject.as_str() },
                doc! { "$set": login_fields.clone() },
            )
            .with_options(return_updated())
            .await?;
        if existing.is_some() {
            return Ok(existing);
        }

        if identity.email_verified {
            let mut link_fields = login_fields.clone();
            link_fields.insert("google_sub", identity.subject.clone());

            let linked = collection
                .find_one_and_update(
                    doc! { "email": identity.email.as_str(), "google_sub": { "$exists": false } },
                    doc! { "$set": link_fields },
                )
                .with_options(return_updated())
                .await?;
            if linked.is_some() {
                info!("🔗 기존 계정에 Google 연결: {}", identity.email);
                return Ok(linked);
            }
        }

        collection
            .find_one_and_update(
                doc! { "google_sub": identity.subject.as_str() },
                doc! {
                    "$set": login_fields.clone(),
                    "$setOnInsert": insert_fields.clone(),
                },
            )
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .upsert(true)
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let object_id = parse_user_id(id)?;
        let cache_key = Self::cache_key(id);

        if let Ok(Some(cached)) = self.redis.get::<User>(&cache_key).await {
            return Ok(Some(cached));
        }

        let user = self
            .collection()
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(database_error)?;

        if let Some(ref user) = user {
            if let Err(e) = self
                .redis
                .set_with_expiry(&cache_key, user, CacheConfig::user_ttl_seconds())
                .await
            {
                debug!("사용자 캐시 저장 실패: {}", e);
            }
        }

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.collection()
            .find_one(doc! { "email": email })
            .await
            .map_err(database_error)
    }

    async fn upsert_google_user(&self, identity: &GoogleIdentity) -> AppResult<User> {
        let now = DateTime::now();
        let login_fields = google_login_fields(identity, now);

        // $set 과 $setOnInsert 가 같은 경로를 건드리면 서버가 거절합니다.
        let mut insert_fields = bson::to_document(&User::new_google(identity))
            .map_err(|e| AppError::InternalError(format!("User serialization failed: {}", e)))?;
        for key in login_fields.keys() {
            insert_fields.remove(key);
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .try_upsert_google_user(identity, &login_fields, &insert_fields)
                .await
            {
                Ok(Some(user)) => {
                    return self
                        .after_write(Some(user))
                        .await
                        .ok_or_else(|| AppError::InternalError("Upsert returned no user".to_string()));
                }
                Ok(None) => {
                    return Err(AppError::InternalError("Upsert returned no user".to_string()));
                }
                Err(e) if is_duplicate_key(&e) && attempt < UPSERT_ATTEMPTS => {
                    debug!("동시 첫 로그인 감지, 재조회합니다 (sub={})", identity.subject);
                }
                Err(e) if is_duplicate_key(&e) => return Err(email_conflict()),
                Err(e) => return Err(database_error(e)),
            }
        }
    }

    async fn insert(&self, mut user: User) -> AppResult<User> {
        let result = self.collection().insert_one(&user).await.map_err(|e| {
            if is_duplicate_key(&e) {
                email_conflict()
            } else {
                database_error(e)
            }
        })?;

        user.id = Some(result.inserted_id.as_object_id().ok_or_else(|| {
            AppError::InternalError("MongoDB returned a non-ObjectId _id".to_string())
        })?);
        Ok(user)
    }

    async fn record_login(&self, id: &str) -> AppResult<()> {
        let object_id = parse_user_id(id)?;
        let now = DateTime::now();

        self.collection()
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": { "last_login_at": now, "updated_at": now } },
            )
            .await
            .map_err(database_error)?;

        self.invalidate_cache(id).await;
        Ok(())
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> AppResult<Option<User>> {
        let object_id = parse_user_id(id)?;

        let mut fields = doc! { "updated_at": DateTime::now() };
        if let Some(name) = &update.display_name {
            fields.insert("display_name", name.clone());
        }
        if let Some(image) = &update.profile_image_url {
            fields.insert("profile_image_url", image.clone());
        }

        let user = self
            .collection()
            .find_one_and_update(doc! { "_id": object_id }, doc! { "$set": fields })
            .with_options(return_updated())
            .await
            .map_err(database_error)?;

        Ok(self.after_write(user).await)
    }

    async fn add_xp(&self, id: &str, amount: i64) -> AppResult<Option<User>> {
        let object_id = parse_user_id(id)?;

        // 경험치 누적과 레벨 계산을 한 번의 파이프라인 업데이트로 처리합니다.
        let pipeline = vec![
            doc! { "$set": {
                "xp_points": { "$add": [ { "$ifNull": ["$xp_points", 0_i64] }, amount ] },
            } },
            doc! { "$set": {
                "level": { "$toInt": { "$min": [
                    100,
                    { "$max": [1, { "$add": [ { "$floor": { "$divide": ["$xp_points", 100] } }, 1 ] }] },
                ] } },
                "updated_at": DateTime::now(),
            } },
        ];

        let user = self
            .collection()
            .find_one_and_update(doc! { "_id": object_id }, pipeline)
            .with_options(return_updated())
            .await
            .map_err(database_error)?;

        Ok(self.after_write(user).await)
    }

    async fn increment_games_played(&self, id: &str) -> AppResult<Option<User>> {
        let object_id = parse_user_id(id)?;

        let user = self
            .collection()
            .find_one_and_update(
                doc! { "_id": object_id },
                doc! {
                    "$inc": { "games_played": 1_i64 },
                    "$set": { "updated_at": DateTime::now() },
                },
            )
            .with_options(return_updated())
            .await
            .map_err(database_error)?;

        Ok(self.after_write(user).await)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let object_id = parse_user_id(id)?;

        let result = self
            .collection()
            .delete_one(doc! { "_id": object_id })
            .await
            .map_err(database_error)?;

        self.invalidate_cache(id).await;
        Ok(result.deleted_count > 0)
    }

    async fn list(&self, limit: i64, after: Option<&str>) -> AppResult<Vec<User>> {
        let filter = match after {
            Some(after) => doc! { "_id": { "$gt": parse_user_id(after)? } },
            None => doc! {},
        };

        self.collection()
            .find(filter)
            .sort(doc! { "_id": 1 })
            .limit(limit)
            .await
            .map_err(database_error)?
            .try_collect()
            .await
            .map_err(database_error)
    }
}

fn init_user_repository() -> LocalBoxFuture<'static, AppResult<()>> {
    Box::pin(async {
        // 메모리 저장소 모드에서는 등록되지 않습니다.
        if !ServiceLocator::contains::<UserRepository>() {
            return Ok(());
        }
        UserRepository::instance()?.create_indexes().await
    })
}

inventory::submit! {
    RepositoryRegistration {
        name: "user_repository",
        init: init_user_repository,
    }
}

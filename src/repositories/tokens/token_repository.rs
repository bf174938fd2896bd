//! # 리프레시 토큰 저장소
//!
//! 리프레시 토큰은 불투명(opaque) 값이며 원문 대신 SHA-256 해시로만 저장됩니다.
//!
//! ## Redis 키 구조
//!
//! ```text
//! refresh_token:{sha256}        → RefreshTokenRecord (JSON), TTL = 남은 유효 시간
//! user_refresh_tokens:{user_id} → SET of sha256, 사용자 단위 일괄 폐기용
//! ```
//!
//! 토큰 교환은 `GETDEL`로 꺼내는 즉시 삭제하므로 같은 토큰으로 동시에 두 번
//! 갱신을 시도해도 한 요청만 성공합니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};

use crate::caching::redis::RedisClient;
use crate::core::errors::{AppError, AppResult};
use crate::domain::models::token::RefreshTokenRecord;

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn save(&self, record: &RefreshTokenRecord) -> AppResult<()>;

    /// 토큰 정보를 꺼내면서 삭제합니다. 이미 사용됐거나 없으면 `None`.
    async fn take(&self, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>>;

    async fn revoke(&self, token_hash: &str) -> AppResult<bool> {
        Ok(self.take(token_hash).await?.is_some())
    }

    /// 사용자의 모든 리프레시 토큰을 폐기하고 폐기한 개수를 돌려줍니다.
    async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64>;
}

fn redis_error(e: redis::RedisError) -> AppError {
    AppError::RedisError(e.to_string())
}

pub struct TokenRepository {
    redis: Arc<RedisClient>,
}

impl TokenRepository {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    fn token_key(token_hash: &str) -> String {
        format!("refresh_token:{}", token_hash)
    }

    fn user_index_key(user_id: &str) -> String {
        format!("user_refresh_tokens:{}", user_id)
    }
}

#[async_trait]
impl RefreshTokenStore for TokenRepository {
    async fn save(&self, record: &RefreshTokenRecord) -> AppResult<()> {
        let ttl_seconds = (record.expires_at - Utc::now().timestamp()).max(1) as u64;
        let json = serde_json::to_string(record)
            .map_err(|e| AppError::InternalError(format!("Token serialization failed: {}", e)))?;
        let index_key = Self::user_index_key(&record.user_id);

        let mut conn = self.redis.connection().await.map_err(redis_error)?;
        redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(Self::token_key(&record.token_hash))
            .arg(json)
            .arg("EX")
            .arg(ttl_seconds)
            .ignore()
            .cmd("SADD")
            .arg(&index_key)
            .arg(&record.token_hash)
            .ignore()
            .cmd("EXPIRE")
            .arg(&index_key)
            .arg(ttl_seconds)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(redis_error)?;

        debug!("리프레시 토큰 저장 - user_id: {}, ttl: {}초", record.user_id, ttl_seconds);
        Ok(())
    }

    async fn take(&self, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>> {
        let record = self
            .redis
            .take::<RefreshTokenRecord>(&Self::token_key(token_hash))
            .await
            .map_err(redis_error)?;

        if let Some(ref record) = record {
            let mut conn = self.redis.connection().await.map_err(redis_error)?;
            redis::cmd("SREM")
                .arg(Self::user_index_key(&record.user_id))
                .arg(token_hash)
                .query_async::<()>(&mut conn)
                .await
                .map_err(redis_error)?;
        }

        Ok(record)
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let index_key = Self::user_index_key(user_id);
        let mut conn = self.redis.connection().await.map_err(redis_error)?;

        let hashes: Vec<String> = redis::cmd("SMEMBERS")
            .arg(&index_key)
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;

        let keys: Vec<String> = hashes.iter().map(|hash| Self::token_key(hash)).collect();
        let revoked = self.redis.del_multiple(&keys).await.map_err(redis_error)?;
        self.redis.del(&index_key).await.map_err(redis_error)?;

        info!("🔒 사용자 리프레시 토큰 {}개 폐기 - user_id: {}", revoked, user_id);
        Ok(revoked)
    }
}

/// 프로세스 메모리 리프레시 토큰 저장소 (`STORAGE_BACKEND=memory`, 테스트)
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    records: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RefreshTokenRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn active_count_for(&self, user_id: &str) -> usize {
        let now = Utc::now().timestamp();
        self.lock()
            .values()
            .filter(|record| record.user_id == user_id && !record.is_expired_at(now))
            .count()
    }

    #[cfg(test)]
    fn stored_count(&self) -> usize {
        self.lock().len()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(&self, record: &RefreshTokenRecord) -> AppResult<()> {
        let now = Utc::now().timestamp();
        let mut records = self.lock();
        // Redis의 TTL 만료에 해당
        records.retain(|_, stored| !stored.is_expired_at(now));
        records.insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn take(&self, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>> {
        let now = Utc::now().timestamp();
        Ok(self
            .lock()
            .remove(token_hash)
            .filter(|record| !record.is_expired_at(now)))
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| record.user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}

//! # Redis 클라이언트
//!
//! JSON 직렬화를 곁들인 얇은 Redis 래퍼입니다.
//! 모든 호출은 멀티플렉싱 연결 위에서 비동기로 실행됩니다.
//! 여러 명령을 원자적으로 묶어야 하는 호출자는 [`RedisClient::connection`]으로
//! 연결을 얻어 파이프라인을 직접 구성합니다.

use std::env;

use log::info;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use serde::{Serialize, de::DeserializeOwned};

use crate::core::errors::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisClient {
    client: Client,
}

fn serialization_error(e: serde_json::Error) -> RedisError {
    RedisError::from((redis::ErrorKind::TypeError, "JSON conversion failed", e.to_string()))
}

impl RedisClient {
    /// `REDIS_URL`로 연결하고 `PING`으로 가용성을 확인합니다.
    pub async fn new() -> AppResult<Self> {
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = Client::open(redis_url)
            .map_err(|e| AppError::RedisError(format!("Invalid REDIS_URL: {}", e)))?;
        let redis = Self { client };
        redis
            .ping()
            .await
            .map_err(|e| AppError::RedisError(e.to_string()))?;

        info!("✅ Redis 연결 성공");
        Ok(redis)
    }

    pub async fn connection(&self) -> Result<MultiplexedConnection, RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<()>(&mut conn).await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RedisError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;

        value
            .map(|json| serde_json::from_str(&json).map_err(serialization_error))
            .transpose()
    }

    pub async fn set_with_expiry<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        seconds: u64,
    ) -> Result<(), RedisError> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(value).map_err(serialization_error)?;
        conn.set_ex(key, json, seconds).await
    }

    /// 값을 읽는 즉시 삭제합니다 (`GETDEL`). 동시에 호출돼도 한 쪽만 값을 받습니다.
    pub async fn take<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RedisError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("GETDEL").arg(key).query_async(&mut conn).await?;

        value
            .map(|json| serde_json::from_str(&json).map_err(serialization_error))
            .transpose()
    }

    pub async fn del(&self, key: &str) -> Result<bool, RedisError> {
        let mut conn = self.connection().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    pub async fn del_multiple(&self, keys: &[String]) -> Result<u64, RedisError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        conn.del(keys).await
    }
}

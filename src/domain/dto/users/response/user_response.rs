//! 사용자 응답 DTO
//!
//! 비밀번호 해시처럼 외부로 나가면 안 되는 필드를 걸러내고,
//! BSON 날짜를 RFC 3339 문자열로 직렬화되는 chrono 타입으로 바꿉니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuthProvider;
use crate::domain::entities::users::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub auth_provider: AuthProvider,
    pub is_provider_linked: bool,
    pub is_email_verified: bool,
    pub xp_points: i64,
    pub level: i32,
    pub games_played: i64,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn to_chrono(value: mongodb::bson::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value.timestamp_millis())
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let is_provider_linked = user.is_provider_linked();

        Self {
            id: user.id_string().unwrap_or_default(),
            email: user.email,
            name: user.display_name,
            image: user.profile_image_url,
            auth_provider: user.auth_provider,
            is_provider_linked,
            is_email_verified: user.is_email_verified,
            xp_points: user.xp_points,
            level: user.level,
            games_played: user.games_played,
            last_login: user.last_login_at.and_then(to_chrono),
            created_at: to_chrono(user.created_at),
            updated_at: to_chrono(user.updated_at),
        }
    }
}

/// 페이지 단위 사용자 목록
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub count: usize,
    /// 다음 페이지 요청 시 `last_key`로 전달
    pub last_evaluated_key: Option<String>,
}

//! 사용자 관리 요청 DTO

use serde::Deserialize;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// `PUT /users/{id}`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "이름은 1자 이상 100자 이하여야 합니다"))]
    pub name: Option<String>,

    #[validate(url(message = "유효한 이미지 URL이 아닙니다"))]
    pub image: Option<String>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none()
    }
}

/// `PUT /users/{id}/xp`
#[derive(Debug, Deserialize, Validate)]
pub struct XpUpdateRequest {
    #[validate(range(min = 1, message = "xp_increase는 양수여야 합니다"))]
    pub xp_increase: i64,
}

/// `GET /users?limit=&last_key=`
#[derive(Debug, Deserialize, Validate)]
pub struct ListUsersQuery {
    #[validate(range(min = 1, max = 1000, message = "limit은 1~1000 사이여야 합니다"))]
    pub limit: Option<i64>,
    pub last_key: Option<String>,
}

impl ListUsersQuery {
    pub fn page_size(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

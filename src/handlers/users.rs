//! # User Management HTTP Handlers
//!
//! 모든 엔드포인트는 `AuthMiddleware::required()` 뒤에 있습니다.
//! 수정/삭제 계열은 본인 또는 `admin` 역할만 허용됩니다 (403).
//!
//! | 메서드 | 경로 | 설명 | 상태 코드 |
//! |--------|------|------|-----------|
//! | `GET` | `/users` | 목록 (`limit`, `last_key`), admin 전용 | 200 OK |
//! | `GET` | `/users/me` | 현재 사용자 | 200 OK |
//! | `GET` | `/users/email/{email}` | 이메일로 조회 | 200 OK |
//! | `GET` | `/users/{id}` | ID로 조회 | 200 OK |
//! | `PUT` | `/users/{id}` | 이름/이미지 수정 | 200 OK |
//! | `DELETE` | `/users/{id}` | 삭제 + 세션 폐기 | 204 No Content |
//! | `PUT` | `/users/{id}/xp` | 경험치 증가 | 200 OK |
//! | `PUT` | `/users/{id}/game-played` | 게임 횟수 증가 | 200 OK |

use actix_web::{HttpResponse, delete, get, put, web};
use validator::Validate;

use crate::core::errors::AppError;
use crate::domain::dto::users::request::{ListUsersQuery, UpdateUserRequest, XpUpdateRequest};
use crate::domain::entities::users::user::ADMIN_ROLE;
use crate::domain::models::auth::AuthenticatedUser;
use crate::middlewares::AuthMiddleware;
use crate::services::users::UserService;

#[get("", wrap = "AuthMiddleware::required_with_role(ADMIN_ROLE)")]
pub async fn list_users(query: web::Query<ListUsersQuery>) -> Result<HttpResponse, AppError> {
    query.validate()?;

    let page = UserService::instance()?.list_users(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/me")]
pub async fn get_me(auth_user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
    let user = UserService::instance()?
        .get_user_by_id(&auth_user.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(user))
}

#[get("/email/{email}")]
pub async fn get_user_by_email(email: web::Path<String>) -> Result<HttpResponse, AppError> {
    let user = UserService::instance()?.get_user_by_email(&email).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[get("/{user_id}")]
pub async fn get_user(user_id: web::Path<String>) -> Result<HttpResponse, AppError> {
    let user = UserService::instance()?.get_user_by_id(&user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[put("/{user_id}")]
pub async fn update_user(
    auth_user: AuthenticatedUser,
    user_id: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    auth_user.ensure_can_manage(&user_id)?;
    payload.validate()?;

    let user = UserService::instance()?
        .update_profile(&user_id, payload.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(user))
}

#[delete("/{user_id}")]
pub async fn delete_user(
    auth_user: AuthenticatedUser,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth_user.ensure_can_manage(&user_id)?;

    UserService::instance()?.delete_user(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[put("/{user_id}/xp")]
pub async fn add_xp(
    auth_user: AuthenticatedUser,
    user_id: web::Path<String>,
    payload: web::Json<XpUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    auth_user.ensure_can_manage(&user_id)?;
    payload.validate()?;

    let user = UserService::instance()?
        .add_xp(&user_id, payload.xp_increase)
        .await?;

    Ok(HttpResponse::Ok().json(user))
}

#[put("/{user_id}/game-played")]
pub async fn record_game_played(
    auth_user: AuthenticatedUser,
    user_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    auth_user.ensure_can_manage(&user_id)?;

    let user = UserService::instance()?.record_game_played(&user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

//! Authentication HTTP Handlers
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | `POST` | `/auth/google-login` | Google ID 토큰 → 자체 토큰 쌍 |
//! | `GET` | `/auth/google/login` | Authorization Code Flow 시작 URL |
//! | `GET` | `/auth/google/callback` | code 교환 후 토큰 쌍 발급 |
//! | `POST` | `/auth/register` | 로컬 계정 등록 |
//! | `POST` | `/auth/login` | 이메일/비밀번호 로그인 |
//! | `POST` | `/auth/refresh` | 리프레시 토큰 교환 (1회용) |
//! | `POST` | `/auth/logout` | 리프레시 토큰 폐기 |
//! | `POST` | `/auth/logout-all` | 사용자의 모든 세션 폐기 |
//! | `POST` | `/auth/verify` | 액세스 토큰 검증 |
//! | `GET` | `/auth/me` | 현재 사용자 |
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use log::warn;
use validator::Validate;

use crate::core::errors::{AppError, AppResult};
use crate::domain::dto::users::request::{
    GoogleLoginRequest, LocalLoginRequest, OAuthCallbackQuery, RefreshTokenRequest,
    RegisterRequest,
};
use crate::domain::dto::users::response::{RevokedSessionsResponse, TokenVerificationResponse};
use crate::domain::models::auth::AuthenticatedUser;
use crate::services::auth::{GoogleAuthService, SessionService, TokenService};
use crate::services::users::UserService;

const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Google ID 토큰 로그인
///
/// # Endpoint
/// `POST /auth/google-login`
///
/// 검증에 실패하면 401이며 사용자 레코드는 건드리지 않습니다.
#[post("/google-login")]
pub async fn google_login(payload: web::Json<GoogleLoginRequest>) -> AppResult<HttpResponse> {
    payload.validate()?;

    let credential = GoogleAuthService::instance()?
        .google_login(payload.id_token.trim())
        .await?;

    Ok(HttpResponse::Ok().json(credential))
}

/// # Endpoint
/// `GET /auth/google/login`
#[get("/google/login")]
pub async fn google_login_url() -> AppResult<HttpResponse> {
    let url_response = GoogleAuthService::instance()?.login_url()?;
    Ok(HttpResponse::Ok().json(url_response))
}

/// Google OAuth 콜백
///
/// # Endpoint
/// `GET /auth/google/callback?code={code}&state={state}`
#[get("/google/callback")]
pub async fn google_oauth_callback(query: web::Query<OAuthCallbackQuery>) -> AppResult<HttpResponse> {
    // 사용자가 동의를 거부한 경우 등
    if let Some(error) = &query.error {
        let description = query
            .error_description
            .as_deref()
            .unwrap_or("OAuth 인증이 취소되었거나 실패했습니다");
        warn!("Google OAuth 에러: {} - {}", error, description);
        return Err(AppError::AuthenticationError(description.to_string()));
    }

    let (code, state) = match (query.code.as_deref(), query.state.as_deref()) {
        (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => (code, state),
        _ => {
            return Err(AppError::ValidationError(
                "code와 state 파라미터가 필요합니다".to_string(),
            ));
        }
    };

    let credential = GoogleAuthService::instance()?
        .authenticate_with_code(code, state)
        .await?;

    Ok(HttpResponse::Ok().json(credential))
}

/// # Endpoint
/// `POST /auth/register`
#[post("/register")]
pub async fn register(payload: web::Json<RegisterRequest>) -> AppResult<HttpResponse> {
    payload.validate()?;

    let user = UserService::instance()?.register(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

/// # Endpoint
/// `POST /auth/login`
#[post("/login")]
pub async fn local_login(payload: web::Json<LocalLoginRequest>) -> AppResult<HttpResponse> {
    payload.validate()?;

    let credential = UserService::instance()?
        .login(&payload.email, &payload.password)
        .await?;

    Ok(HttpResponse::Ok().json(credential))
}

/// 리프레시 토큰 교환
///
/// # Endpoint
/// `POST /auth/refresh`
///
/// 토큰은 요청 본문 또는 `refresh_token` 쿠키에서 읽습니다.
#[post("/refresh")]
pub async fn refresh_tokens(
    req: HttpRequest,
    body: Option<web::Json<RefreshTokenRequest>>,
) -> AppResult<HttpResponse> {
    let refresh_token = extract_refresh_token(&req, body.as_deref())?;

    let credential = SessionService::instance()?.refresh(&refresh_token).await?;
    Ok(HttpResponse::Ok().json(credential))
}

/// # Endpoint
/// `POST /auth/logout`
#[post("/logout")]
pub async fn logout(
    req: HttpRequest,
    body: Option<web::Json<RefreshTokenRequest>>,
) -> AppResult<HttpResponse> {
    let refresh_token = extract_refresh_token(&req, body.as_deref())?;

    SessionService::instance()?.logout(&refresh_token).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// # Endpoint
/// `POST /auth/logout-all`
#[post("/logout-all")]
pub async fn logout_all(auth_user: AuthenticatedUser) -> AppResult<HttpResponse> {
    let revoked = SessionService::instance()?
        .logout_all(&auth_user.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(RevokedSessionsResponse { revoked }))
}

/// 액세스 토큰 검증
///
/// # Endpoint
/// `POST /auth/verify`
#[post("/verify")]
pub async fn verify_token(req: HttpRequest) -> AppResult<HttpResponse> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("Authorization 헤더가 없습니다".to_string()))?;

    let token = TokenService::extract_bearer_token(auth_header)?;
    let claims = TokenService::instance()?.verify_access_token(token)?;

    Ok(HttpResponse::Ok().json(TokenVerificationResponse::from(claims)))
}

/// # Endpoint
/// `GET /auth/me`
#[get("/me")]
pub async fn get_current_user(auth_user: AuthenticatedUser) -> AppResult<HttpResponse> {
    let user = UserService::instance()?
        .get_user_by_id(&auth_user.user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::AuthenticationError("사용자를 찾을 수 없습니다".to_string()),
            other => other,
        })?;

    Ok(HttpResponse::Ok().json(user))
}

/// 본문을 우선하고, 없으면 쿠키에서 리프레시 토큰을 찾습니다.
fn extract_refresh_token(req: &HttpRequest, body: Option<&RefreshTokenRequest>) -> AppResult<String> {
    if let Some(token) = body
        .and_then(|body| body.refresh_token.as_deref())
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        return Ok(token.to_string());
    }

    if let Some(cookie) = req.cookie(REFRESH_TOKEN_COOKIE) {
        let token = cookie.value().trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    Err(AppError::AuthenticationError(
        "리프레시 토큰이 제공되지 않았습니다".to_string(),
    ))
}

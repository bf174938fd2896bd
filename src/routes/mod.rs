//! API 라우트 설정 모듈
//!
//! ```text
//! /                        서비스 정보
//! /health                  헬스체크
//! /api/v1/auth/...         인증 (AuthMiddleware::optional)
//! /api/v1/users/...        사용자 관리 (AuthMiddleware::required_with_roles)
//! ```
//!
//! `/api/v1/auth` 스코프는 로그인 전 요청을 받아야 하므로 선택적 인증만 겁니다.
//! `/auth/me`, `/auth/logout-all`은 `AuthenticatedUser` extractor가 없으면 401을 돌려줍니다.

use actix_web::{HttpResponse, get, web};
use serde_json::json;

use crate::core::errors::AppError;
use crate::domain::entities::users::user::{ADMIN_ROLE, DEFAULT_ROLE};
use crate::handlers;
use crate::middlewares::AuthMiddleware;

pub fn configure_all_routes(cfg: &mut web::ServiceConfig) {
    // 본문/쿼리 파싱 실패도 같은 에러 형식으로 응답
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::ValidationError(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::ValidationError(err.to_string()).into()),
    );

    cfg.service(root).service(health_check);

    configure_auth_routes(cfg);
    configure_user_routes(cfg);
}

fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/auth")
            .wrap(AuthMiddleware::optional())
            // Google
            .service(handlers::auth::google_login)
            .service(handlers::auth::google_login_url)
            .service(handlers::auth::google_oauth_callback)
            // 로컬 계정
            .service(handlers::auth::register)
            .service(handlers::auth::local_login)
            // 세션
            .service(handlers::auth::refresh_tokens)
            .service(handlers::auth::logout)
            .service(handlers::auth::logout_all)
            .service(handlers::auth::verify_token)
            .service(handlers::auth::get_current_user),
    );
}

fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    // 고정 경로가 `/{user_id}`보다 먼저 등록되어야 합니다.
    cfg.service(
        web::scope("/api/v1/users")
            .wrap(AuthMiddleware::required_with_roles(&[DEFAULT_ROLE, ADMIN_ROLE]))
            .service(handlers::users::list_users)
            .service(handlers::users::get_me)
            .service(handlers::users::get_user_by_email)
            .service(handlers::users::get_user)
            .service(handlers::users::update_user)
            .service(handlers::users::delete_user)
            .service(handlers::users::add_xp)
            .service(handlers::users::record_game_played),
    );
}

#[get("/")]
async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "login": "/api/v1/auth/google-login",
    }))
}

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::oauth::GoogleIdentity;
    use crate::repositories::tokens::InMemoryRefreshTokenStore;
    use crate::repositories::users::UserStore;
    use crate::services::auth::{TokenService, TokenSettings};
    use crate::test_support::{TEST_KID, google_claims, sign_google_id_token, test_services};
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use chrono::Duration;
    use serde_json::Value;
    use std::sync::Arc;

    macro_rules! app {
        () => {{
            test_services();
            test::init_service(App::new().configure(configure_all_routes)).await
        }};
    }

    async fn users_with_sub(sub: &str) -> usize {
        test_services()
            .users
            .list(1000, None)
            .await
            .unwrap()
            .iter()
            .filter(|user| user.google_sub.as_deref() == Some(sub))
            .count()
    }

    fn google_login_request(id_token: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/v1/auth/google-login")
            .set_json(json!({ "id_token": id_token }))
    }

    #[actix_web::test]
    async fn test_health_and_root() {
        let app = app!();

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_health_response_carries_security_headers() {
        test_services();
        let app = test::init_service(
            App::new()
                .wrap(crate::middlewares::security_headers())
                .configure(configure_all_routes),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let headers = resp.headers();
        for (name, expected) in [
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            (header::X_FRAME_OPTIONS, "DENY"),
            (header::X_XSS_PROTECTION, "1; mode=block"),
            (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000; includeSubDomains"),
            (header::REFERRER_POLICY, "no-referrer"),
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ] {
            assert_eq!(headers.get(&name).and_then(|v| v.to_str().ok()), Some(expected), "{}", name);
        }
    }

    #[actix_web::test]
    async fn test_google_login_issues_tokens_and_keeps_one_user() {
        let app = app!();
        let token = sign_google_id_token(&google_claims("http-sub-1", "http1@example.com"), TEST_KID);

        for _ in 0..2 {
            let resp = test::call_service(&app, google_login_request(&token).to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);

            let body: Value = test::read_body_json(resp).await;
            assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
            assert!(body["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
            assert_eq!(body["token_type"], "bearer");
        }

        assert_eq!(users_with_sub("http-sub-1").await, 1);
    }

    #[actix_web::test]
    async fn test_google_login_with_expired_token_is_unauthorized() {
        let app = app!();
        let mut claims = google_claims("http-sub-expired", "expired@example.com");
        claims["exp"] = (chrono::Utc::now().timestamp() - 60).into();

        let resp = test::call_service(
            &app,
            google_login_request(&sign_google_id_token(&claims, TEST_KID)).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "AUTHENTICATION_FAILED");
        assert_eq!(body["error"]["status"], 401);

        assert_eq!(users_with_sub("http-sub-expired").await, 0);
    }

    #[actix_web::test]
    async fn test_google_login_rejects_empty_and_malformed_bodies() {
        let app = app!();

        let resp = test::call_service(&app, google_login_request("").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/google-login")
                .insert_header(header::ContentType::json())
                .set_payload("{not json")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[actix_web::test]
    async fn test_refresh_rotation_over_http() {
        let app = app!();
        let token = sign_google_id_token(&google_claims("http-sub-refresh", "refresh@example.com"), TEST_KID);
        let login: Value = test::read_body_json(
            test::call_service(&app, google_login_request(&token).to_request()).await,
        )
        .await;
        let refresh_token = login["refresh_token"].as_str().unwrap().to_string();

        let refresh = |value: &str| {
            test::TestRequest::post()
                .uri("/api/v1/auth/refresh")
                .set_json(json!({ "refresh_token": value }))
                .to_request()
        };

        let resp = test::call_service(&app, refresh(&refresh_token)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rotated: Value = test::read_body_json(resp).await;
        assert_ne!(rotated["refresh_token"], login["refresh_token"]);

        let resp = test::call_service(&app, refresh(&refresh_token)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_refresh_token_from_cookie_and_logout() {
        let app = app!();
        let (user, _) = test_services().user_with_token("cookie@example.com", &[DEFAULT_ROLE]).await;
        let credential = test_services().token_service().issue_session(&user).await.unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/logout")
                .cookie(actix_web::cookie::Cookie::new("refresh_token", credential.refresh_token.clone()))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/refresh")
                .cookie(actix_web::cookie::Cookie::new("refresh_token", credential.refresh_token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_protected_routes_require_valid_access_token() {
        let app = app!();
        let (user, token) = test_services().user_with_token("me@example.com", &[DEFAULT_ROLE]).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/users/me").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/users/me")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["id"], user.id_string().unwrap());
        assert!(body.get("password_hash").is_none());
    }

    #[actix_web::test]
    async fn test_expired_access_token_is_rejected() {
        let app = app!();
        let (user, _) = test_services().user_with_token("stale@example.com", &[DEFAULT_ROLE]).await;

        let stale_issuer = TokenService::new(
            TokenSettings {
                secret: "http-test-secret".to_string(),
                issuer: "auth-gateway-test".to_string(),
                access_ttl: Duration::minutes(-5),
                refresh_ttl: Duration::days(7),
            },
            Arc::new(InMemoryRefreshTokenStore::new()),
        );
        let expired = stale_issuer.generate_access_token(&user).unwrap();

        for uri in ["/api/v1/users/me", "/api/v1/auth/me"] {
            let resp = test::call_service(
                &app,
                test::TestRequest::get()
                    .uri(uri)
                    .insert_header((header::AUTHORIZATION, format!("Bearer {}", expired)))
                    .to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[actix_web::test]
    async fn test_verify_endpoint_returns_claims() {
        let app = app!();
        let (user, token) = test_services().user_with_token("verify@example.com", &[DEFAULT_ROLE]).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/verify")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["user_id"], user.id_string().unwrap());

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/api/v1/auth/verify").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_users_can_only_manage_themselves() {
        let app = app!();
        let (_, token) = test_services().user_with_token("owner@example.com", &[DEFAULT_ROLE]).await;
        let (other, _) = test_services().user_with_token("other@example.com", &[DEFAULT_ROLE]).await;
        let (_, admin_token) = test_services()
            .user_with_token("admin@example.com", &[DEFAULT_ROLE, ADMIN_ROLE])
            .await;

        let xp = |bearer: &str| {
            test::TestRequest::put()
                .uri(&format!("/api/v1/users/{}/xp", other.id_string().unwrap()))
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", bearer)))
                .set_json(json!({ "xp_increase": 150 }))
                .to_request()
        };

        let resp = test::call_service(&app, xp(&token)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, xp(&admin_token)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["xp_points"], 150);
        assert_eq!(body["level"], 2);
    }

    #[actix_web::test]
    async fn test_listing_users_is_admin_only() {
        let app = app!();
        let (_, token) = test_services().user_with_token("lister@example.com", &[DEFAULT_ROLE]).await;
        let (_, admin_token) = test_services()
            .user_with_token("lister-admin@example.com", &[DEFAULT_ROLE, ADMIN_ROLE])
            .await;

        let list = |bearer: &str| {
            test::TestRequest::get()
                .uri("/api/v1/users?limit=1")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", bearer)))
                .to_request()
        };

        let resp = test::call_service(&app, list(&token)).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = test::call_service(&app, list(&admin_token)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["count"], 1);
        assert!(body["last_evaluated_key"].is_string());
    }

    #[actix_web::test]
    async fn test_logout_all_revokes_sessions_of_caller() {
        let app = app!();
        let services = test_services();
        let user = services
            .users
            .upsert_google_user(&GoogleIdentity {
                subject: "http-sub-logout-all".to_string(),
                email: "logout-all@example.com".to_string(),
                email_verified: true,
                name: None,
                picture: None,
            })
            .await
            .unwrap();
        let first = services.token_service().issue_session(&user).await.unwrap();
        services.token_service().issue_session(&user).await.unwrap();

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/logout-all")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", first.access_token)))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["revoked"], 2);
        assert_eq!(services.refresh_store.active_count_for(&user.id_string().unwrap()), 0);
    }
}

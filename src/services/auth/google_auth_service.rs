//! # Google 로그인 서비스
//!
//! 두 가지 진입 경로를 모두 같은 절차로 마무리합니다.
//!
//! ```text
//! (A) 프론트엔드 위젯            (B) Authorization Code Flow
//! POST /auth/google-login        GET /auth/google/login → Google → GET /auth/google/callback
//!   { id_token }                   state 검증 → code 교환 → id_token
//!        │                                         │
//!        └──────────────┬──────────────────────────┘
//!                       ▼
//!        1. ID 토큰 검증 (서명, iss, aud, exp)
//!        2. 사용자 upsert (google_sub 기준, 동시 요청에도 1명)
//!        3. SessionCredential 발급 (access JWT + 1회용 refresh)
//! ```
//!
//! 1단계가 실패하면 2, 3단계는 실행되지 않습니다. 따라서 검증에 실패한 토큰으로는
//! 사용자 레코드가 생기거나 바뀌지 않습니다.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{GoogleOAuthConfig, OAuthConfig};
use crate::core::errors::{AppError, AppResult, ErrorContext};
use crate::core::registry::ServiceLocator;
use crate::domain::dto::users::response::GoogleLoginUrlResponse;
use crate::domain::models::token::SessionCredential;
use crate::repositories::users::UserStore;
use crate::services::auth::google_token_verifier::{
    GOOGLE_HTTP_TIMEOUT, IdTokenVerifier, google_http_client,
};
use crate::services::auth::token_service::TokenService;

const STATE_PURPOSE: &str = "google_oauth_state";

/// Authorization Code Flow 설정
#[derive(Debug, Clone)]
pub struct GoogleOAuthSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub state_secret: String,
    pub state_ttl: Duration,
    /// 토큰 엔드포인트 호출 제한 시간
    pub http_timeout: std::time::Duration,
}

impl GoogleOAuthSettings {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            client_id: GoogleOAuthConfig::client_id()?,
            client_secret: GoogleOAuthConfig::client_secret(),
            redirect_uri: GoogleOAuthConfig::redirect_uri(),
            auth_uri: GoogleOAuthConfig::auth_uri(),
            token_uri: GoogleOAuthConfig::token_uri(),
            state_secret: OAuthConfig::state_secret(),
            state_ttl: Duration::minutes(OAuthConfig::session_timeout_minutes()),
            http_timeout: GOOGLE_HTTP_TIMEOUT,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OAuthStateClaims {
    nonce: String,
    purpose: String,
    exp: i64,
}

/// Google 토큰 엔드포인트 응답 중 필요한 부분
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    id_token: Option<String>,
}

pub struct GoogleAuthService {
    user_store: Arc<dyn UserStore>,
    verifier: Arc<dyn IdTokenVerifier>,
    token_service: Arc<TokenService>,
    oauth: GoogleOAuthSettings,
    http: reqwest::Client,
}

impl GoogleAuthService {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        verifier: Arc<dyn IdTokenVerifier>,
        token_service: Arc<TokenService>,
        oauth: GoogleOAuthSettings,
    ) -> AppResult<Self> {
        let http = google_http_client(oauth.http_timeout)?;
        Ok(Self {
            user_store,
            verifier,
            token_service,
            oauth,
            http,
        })
    }

    pub fn instance() -> AppResult<Arc<Self>> {
        ServiceLocator::get::<Self>()
    }

    /// Google ID 토큰으로 로그인하고 자체 자격 증명을 발급합니다.
    ///
    /// # Errors
    ///
    /// - 검증 실패: `AppError::AuthenticationError` (사용자 변경 없음)
    /// - 이메일 미제공: `AppError::ValidationError`
    /// - 이메일이 다른 Google 계정에 연결됨: `AppError::ConflictError`
    /// - 저장소 장애: `AppError::DatabaseError` / `AppError::RedisError`
    pub async fn google_login(&self, id_token: &str) -> AppResult<SessionCredential> {
        let identity = self.verifier.verify(id_token).await?;

        let user = self.user_store.upsert_google_user(&identity).await?;
        if !user.is_active {
            warn!("🚫 비활성 계정의 Google 로그인 시도: {}", user.email);
            return Err(AppError::AuthenticationError("Account is disabled".to_string()));
        }

        let credential = self.token_service.issue_session(&user).await?;
        info!("✅ Google 로그인 성공: {}", user.email);
        Ok(credential)
    }

    pub fn login_url(&self) -> AppResult<GoogleLoginUrlResponse> {
        let state = self.generate_oauth_state()?;

        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("redirect_uri", self.oauth.redirect_uri.as_str()),
            ("scope", "openid email profile"),
            ("response_type", "code"),
            ("access_type", "online"),
            ("prompt", "select_account"),
            ("state", state.as_str()),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(GoogleLoginUrlResponse {
            login_url: format!("{}?{}", self.oauth.auth_uri, query_string),
            state,
        })
    }

    /// Authorization code를 ID 토큰으로 교환한 뒤 [`Self::google_login`]과 같은 절차를 밟습니다.
    pub async fn authenticate_with_code(&self, code: &str, state: &str) -> AppResult<SessionCredential> {
        self.verify_oauth_state(state)?;
        let id_token = self.exchange_code_for_id_token(code).await?;
        self.google_login(&id_token).await
    }

    async fn exchange_code_for_id_token(&self, code: &str) -> AppResult<String> {
        let client_secret = self.oauth.client_secret.as_deref().ok_or_else(|| {
            AppError::InternalError("GOOGLE_CLIENT_SECRET must be set for the code flow".to_string())
        })?;

        let params = [
            ("code", code),
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", client_secret),
            ("redirect_uri", self.oauth.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.oauth.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 토큰 요청 실패: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            // 만료되었거나 이미 사용된 code
            return Err(AppError::AuthenticationError(
                "Authorization code was rejected by Google".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Google 토큰 교환 실패: HTTP {}",
                status
            )));
        }

        response
            .json::<GoogleTokenResponse>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 토큰 응답 파싱 실패: {}", e)))?
            .id_token
            .ok_or_else(|| {
                AppError::ExternalServiceError("Google 토큰 응답에 id_token이 없습니다".to_string())
            })
    }

    /// 서명된 state 값을 만듭니다. 서버에 따로 저장하지 않습니다.
    fn generate_oauth_state(&self) -> AppResult<String> {
        let claims = OAuthStateClaims {
            nonce: Uuid::new_v4().to_string(),
            purpose: STATE_PURPOSE.to_string(),
            exp: (Utc::now() + self.oauth.state_ttl).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.oauth.state_secret.as_bytes()),
        )
        .context("OAuth state 생성 실패")
    }

    fn verify_oauth_state(&self, state: &str) -> AppResult<()> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<OAuthStateClaims>(
            state,
            &DecodingKey::from_secret(self.oauth.state_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::AuthenticationError("유효하지 않은 OAuth state".to_string()))?
        .claims;

        if claims.purpose != STATE_PURPOSE {
            return Err(AppError::AuthenticationError("유효하지 않은 OAuth state".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::tokens::InMemoryRefreshTokenStore;
    use crate::repositories::users::InMemoryUserStore;
    use crate::services::auth::google_token_verifier::GoogleIdTokenVerifier;
    use crate::services::auth::token_service::TokenSettings;
    use crate::test_support::{
        TEST_CLIENT_ID, TEST_KID, google_claims, sign_google_id_token, test_key_set,
    };
    use futures_util::future::join;

    struct Fixture {
        users: Arc<InMemoryUserStore>,
        tokens: Arc<TokenService>,
        service: GoogleAuthService,
    }

    fn oauth_settings() -> GoogleOAuthSettings {
        GoogleOAuthSettings {
            client_id: TEST_CLIENT_ID.to_string(),
            client_secret: None,
            redirect_uri: "http://localhost:8080/api/v1/auth/google/callback".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            state_secret: "state-secret".to_string(),
            state_ttl: Duration::minutes(10),
            http_timeout: GOOGLE_HTTP_TIMEOUT,
        }
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let tokens = Arc::new(TokenService::new(
            TokenSettings {
                secret: "google-auth-test".to_string(),
                issuer: "auth-gateway-test".to_string(),
                access_ttl: Duration::minutes(30),
                refresh_ttl: Duration::days(7),
            },
            Arc::new(InMemoryRefreshTokenStore::new()),
        ));
        let verifier = Arc::new(GoogleIdTokenVerifier::with_static_keys(
            TEST_CLIENT_ID.to_string(),
            test_key_set(),
        ));

        let service =
            GoogleAuthService::new(users.clone(), verifier, tokens.clone(), oauth_settings()).unwrap();
        Fixture { users, tokens, service }
    }

    #[actix_web::test]
    async fn test_repeated_logins_keep_exactly_one_user() {
        let fx = fixture();
        let token = sign_google_id_token(&google_claims("sub-repeat", "repeat@example.com"), TEST_KID);

        let first = fx.service.google_login(&token).await.unwrap();
        let second = fx.service.google_login(&token).await.unwrap();
        let third = fx.service.google_login(&token).await.unwrap();

        assert_eq!(fx.users.len(), 1);
        let subjects: Vec<String> = [first, second, third]
            .iter()
            .map(|c| fx.tokens.verify_access_token(&c.access_token).unwrap().sub)
            .collect();
        assert!(subjects.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[actix_web::test]
    async fn test_first_login_populates_profile_from_claims() {
        let fx = fixture();
        let token = sign_google_id_token(&google_claims("sub-profile", "Profile@Example.com"), TEST_KID);

        fx.service.google_login(&token).await.unwrap();

        let user = fx.users.find_by_email("profile@example.com").await.unwrap().unwrap();
        assert_eq!(user.google_sub.as_deref(), Some("sub-profile"));
        assert_eq!(user.display_name.as_deref(), Some("Test Learner"));
        assert_eq!(user.profile_image_url.as_deref(), Some("https://example.com/avatar.png"));
        assert!(user.is_email_verified);
    }

    #[actix_web::test]
    async fn test_rejected_tokens_create_no_user() {
        let fx = fixture();

        let mut expired = google_claims("sub-bad", "bad@example.com");
        expired["exp"] = (Utc::now().timestamp() - 3600).into();

        let mut wrong_audience = google_claims("sub-bad", "bad@example.com");
        wrong_audience["aud"] = "other-app.apps.googleusercontent.com".into();

        let valid = sign_google_id_token(&google_claims("sub-bad", "bad@example.com"), TEST_KID);
        let (signed_part, signature) = valid.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { "B" } else { "A" };
        let bad_signature = format!("{}.{}{}", signed_part, flipped, &signature[1..]);

        for token in [
            sign_google_id_token(&expired, TEST_KID),
            sign_google_id_token(&wrong_audience, TEST_KID),
            bad_signature,
        ] {
            let result = fx.service.google_login(&token).await;
            assert!(matches!(result, Err(AppError::AuthenticationError(_))));
        }

        assert!(fx.users.is_empty());
    }

    #[actix_web::test]
    async fn test_rejected_token_does_not_mutate_existing_user() {
        let fx = fixture();
        let valid = sign_google_id_token(&google_claims("sub-keep", "keep@example.com"), TEST_KID);
        fx.service.google_login(&valid).await.unwrap();
        let before = fx.users.find_by_email("keep@example.com").await.unwrap().unwrap();

        let mut expired = google_claims("sub-keep", "keep@example.com");
        expired["name"] = "Attacker".into();
        expired["exp"] = (Utc::now().timestamp() - 3600).into();
        assert!(fx.service.google_login(&sign_google_id_token(&expired, TEST_KID)).await.is_err());

        let after = fx.users.find_by_email("keep@example.com").await.unwrap().unwrap();
        assert_eq!(after.display_name, before.display_name);
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(fx.users.len(), 1);
    }

    #[actix_web::test]
    async fn test_concurrent_first_logins_create_one_user() {
        let fx = fixture();
        let token = sign_google_id_token(&google_claims("sub-race", "race@example.com"), TEST_KID);

        let (a, b) = join(fx.service.google_login(&token), fx.service.google_login(&token)).await;

        let a = fx.tokens.verify_access_token(&a.unwrap().access_token).unwrap();
        let b = fx.tokens.verify_access_token(&b.unwrap().access_token).unwrap();
        assert_eq!(a.sub, b.sub);
        assert_eq!(fx.users.len(), 1);
    }

    #[actix_web::test]
    async fn test_inactive_user_cannot_log_in() {
        let fx = fixture();
        let token = sign_google_id_token(&google_claims("sub-off", "off@example.com"), TEST_KID);
        fx.service.google_login(&token).await.unwrap();

        let mut user = fx.users.find_by_email("off@example.com").await.unwrap().unwrap();
        user.is_active = false;
        fx.users.delete(&user.id_string().unwrap()).await.unwrap();
        fx.users.insert(user).await.unwrap();

        assert!(matches!(
            fx.service.google_login(&token).await,
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_login_url_carries_verifiable_state() {
        let fx = fixture();
        let response = fx.service.login_url().unwrap();

        assert!(response.login_url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(response.login_url.contains("client_id=test-client.apps.googleusercontent.com"));
        assert!(response.login_url.contains("scope=openid%20email%20profile"));
        assert!(fx.service.verify_oauth_state(&response.state).is_ok());
    }

    #[test]
    fn test_foreign_state_is_rejected() {
        let fx = fixture();
        assert!(fx.service.verify_oauth_state("forged-state").is_err());

        let other = GoogleAuthService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(GoogleIdTokenVerifier::with_static_keys(TEST_CLIENT_ID.to_string(), test_key_set())),
            fx.tokens.clone(),
            GoogleOAuthSettings { state_secret: "different".to_string(), ..oauth_settings() },
        )
        .unwrap();
        let state = other.login_url().unwrap().state;
        assert!(fx.service.verify_oauth_state(&state).is_err());
    }

    #[actix_web::test]
    async fn test_code_flow_without_client_secret_fails_before_network() {
        let fx = fixture();
        let state = fx.service.login_url().unwrap().state;

        assert!(matches!(
            fx.service.authenticate_with_code("code", &state).await,
            Err(AppError::InternalError(_))
        ));
    }

    #[actix_web::test]
    async fn test_stalled_token_endpoint_times_out() {
        // 연결은 받지만 응답하지 않는 엔드포인트
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let token_uri = format!("http://{}/token", listener.local_addr().unwrap());

        let fx = fixture();
        let service = GoogleAuthService::new(
            fx.users.clone(),
            Arc::new(GoogleIdTokenVerifier::with_static_keys(TEST_CLIENT_ID.to_string(), test_key_set())),
            fx.tokens.clone(),
            GoogleOAuthSettings {
                client_secret: Some("secret".to_string()),
                token_uri,
                http_timeout: std::time::Duration::from_millis(200),
                ..oauth_settings()
            },
        )
        .unwrap();
        let state = service.login_url().unwrap().state;

        let started = std::time::Instant::now();
        let result = service.authenticate_with_code("code", &state).await;

        assert!(matches!(result, Err(AppError::ExternalServiceError(_))), "got {:?}", result);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(fx.users.len(), 0);
        drop(listener);
    }
}

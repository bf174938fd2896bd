//! 테스트 공용 픽스처
//!
//! Google 대신 ID 토큰에 서명하는 RSA 키와, 그 공개키로 만든 JWK Set을 제공합니다.
//! RSA 키 생성은 느리므로 프로세스당 한 번만 만듭니다.
//!
//! HTTP 테스트용으로 메모리 저장소와 고정 JWK Set 검증기를 물린 서비스를
//! [`ServiceLocator`]에 한 번 등록하는 [`test_services`]도 있습니다.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use once_cell::sync::Lazy;
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};

use crate::core::registry::ServiceLocator;
use crate::domain::entities::users::user::User;
use crate::repositories::tokens::InMemoryRefreshTokenStore;
use crate::repositories::users::{InMemoryUserStore, UserStore};
use crate::services::auth::{
    GOOGLE_HTTP_TIMEOUT, GoogleIdTokenVerifier, GoogleOAuthSettings, TokenService, TokenSettings,
};
use crate::services::{ServiceDependencies, register_services};

pub const TEST_CLIENT_ID: &str = "test-client.apps.googleusercontent.com";
pub const TEST_KID: &str = "test-key-1";

struct TestSigningKey {
    encoding_key: EncodingKey,
    key_set: Value,
}

static SIGNING_KEY: Lazy<TestSigningKey> = Lazy::new(|| {
    let private_key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, 2048).unwrap();
    let public_key = private_key.to_public_key();

    let pem = private_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap();
    let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();

    let key_set = json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": TEST_KID,
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }]
    });

    TestSigningKey { encoding_key, key_set }
});

/// Google 인증서 엔드포인트가 돌려주는 형태의 키 집합
pub fn test_key_set() -> JwkSet {
    serde_json::from_value(SIGNING_KEY.key_set.clone()).unwrap()
}

/// 유효한 Google ID 토큰 페이로드
pub fn google_claims(subject: &str, email: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": "https://accounts.google.com",
        "aud": TEST_CLIENT_ID,
        "sub": subject,
        "email": email,
        "email_verified": true,
        "name": "Test Learner",
        "picture": "https://example.com/avatar.png",
        "iat": now,
        "exp": now + 3600,
    })
}

pub fn sign_google_id_token(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &SIGNING_KEY.encoding_key).unwrap()
}

/// 전역 [`ServiceLocator`]에 등록된 테스트용 구현체
pub struct TestServices {
    pub users: Arc<InMemoryUserStore>,
    pub refresh_store: Arc<InMemoryRefreshTokenStore>,
}

impl TestServices {
    pub fn token_service(&self) -> Arc<TokenService> {
        ServiceLocator::get::<TokenService>().unwrap()
    }

    /// 사용자를 저장하고 액세스 토큰을 함께 돌려줍니다.
    pub async fn user_with_token(&self, email: &str, roles: &[&str]) -> (User, String) {
        let mut user = User::new_local(email.to_string(), None, "unused".to_string());
        user.roles = roles.iter().map(|role| role.to_string()).collect();
        let user = self.users.insert(user).await.unwrap();
        let token = self.token_service().generate_access_token(&user).unwrap();
        (user, token)
    }
}

static TEST_SERVICES: Lazy<TestServices> = Lazy::new(|| {
    let users = Arc::new(InMemoryUserStore::new());
    let refresh_store = Arc::new(InMemoryRefreshTokenStore::new());

    register_services(ServiceDependencies {
        user_store: users.clone(),
        refresh_store: refresh_store.clone(),
        verifier: Arc::new(GoogleIdTokenVerifier::with_static_keys(
            TEST_CLIENT_ID.to_string(),
            test_key_set(),
        )),
        token_settings: TokenSettings {
            secret: "http-test-secret".to_string(),
            issuer: "auth-gateway-test".to_string(),
            access_ttl: Duration::minutes(30),
            refresh_ttl: Duration::days(7),
        },
        oauth_settings: GoogleOAuthSettings {
            client_id: TEST_CLIENT_ID.to_string(),
            client_secret: None,
            redirect_uri: "http://localhost:8080/api/v1/auth/google/callback".to_string(),
            auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            state_secret: "http-test-state".to_string(),
            state_ttl: Duration::minutes(10),
            http_timeout: GOOGLE_HTTP_TIMEOUT,
        },
        bcrypt_cost: 4,
    })
    .expect("test services should register");

    TestServices { users, refresh_store }
});

/// 테스트 프로세스 전체가 공유하는 서비스 구성. 테스트마다 고유한 이메일/sub를 써야 합니다.
pub fn test_services() -> &'static TestServices {
    &TEST_SERVICES
}

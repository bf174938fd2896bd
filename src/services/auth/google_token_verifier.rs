//! # Google ID 토큰 검증
//!
//! Google이 발급한 ID 토큰(JWT, RS256)을 Google 공개키(JWK Set)로 검증합니다.
//!
//! ```text
//! id_token ─► header(kid, alg=RS256) ─► 캐시된 JWK 조회 ─┬─► 서명/iss/aud/exp 검증 ─► GoogleIdentity
//!                                                      └─► kid 없음: 공개키 재조회 (최소 간격 60초)
//! ```
//!
//! 공개키는 응답의 `Cache-Control: max-age` 동안 캐시됩니다.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use log::{debug, info, warn};
use reqwest::header::{CACHE_CONTROL, HeaderMap};

use crate::config::{GOOGLE_ISSUERS, GoogleOAuthConfig};
use crate::core::errors::{AppError, AppResult};
use crate::core::registry::{ServiceLocator, ServiceRegistration};
use crate::domain::models::oauth::{GoogleIdTokenClaims, GoogleIdentity};

const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(60 * 60);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
/// Google 엔드포인트 호출 제한 시간
pub const GOOGLE_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// 외부 신원 토큰 검증기
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    /// # Errors
    ///
    /// - 서명/발급자/대상/만료 검증 실패: `AppError::AuthenticationError`
    /// - 이메일 클레임 없음: `AppError::ValidationError`
    /// - 공개키 조회 실패: `AppError::ExternalServiceError`
    async fn verify(&self, id_token: &str) -> AppResult<GoogleIdentity>;
}

enum KeySource {
    Remote { certs_url: String, http: reqwest::Client },
    Static,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    expires_at: Option<Instant>,
}

impl CachedKeys {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

pub struct GoogleIdTokenVerifier {
    client_id: String,
    source: KeySource,
    cache: RwLock<Option<CachedKeys>>,
}

fn invalid_token(reason: &str) -> AppError {
    debug!("Google ID 토큰 거부: {}", reason);
    AppError::AuthenticationError("Invalid Google ID token".to_string())
}

/// `Cache-Control: public, max-age=19900, must-revalidate` → 19900초
fn max_age(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(CACHE_CONTROL)?
        .to_str()
        .ok()?
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|seconds| seconds.parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl GoogleIdTokenVerifier {
    pub fn new(client_id: String, certs_url: String) -> AppResult<Self> {
        let http = google_http_client(GOOGLE_HTTP_TIMEOUT)?;

        Ok(Self {
            client_id,
            source: KeySource::Remote { certs_url, http },
            cache: RwLock::new(None),
        })
    }

    pub fn from_env() -> AppResult<Self> {
        Self::new(GoogleOAuthConfig::client_id()?, GoogleOAuthConfig::certs_url())
    }

    /// 고정된 키 집합으로만 검증합니다. 원격 조회는 하지 않습니다.
    pub fn with_static_keys(client_id: String, keys: JwkSet) -> Self {
        Self {
            client_id,
            source: KeySource::Static,
            cache: RwLock::new(Some(CachedKeys {
                keys,
                fetched_at: Instant::now(),
                expires_at: None,
            })),
        }
    }

    pub fn instance() -> AppResult<Arc<Self>> {
        ServiceLocator::get::<Self>()
    }

    fn cached_key(&self, kid: &str) -> Option<Jwk> {
        let cache = self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .as_ref()
            .filter(|cached| cached.is_fresh(Instant::now()))
            .and_then(|cached| cached.keys.find(kid).cloned())
    }

    fn recently_fetched(&self) -> bool {
        let cache = self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .as_ref()
            .is_some_and(|cached| cached.is_fresh(Instant::now()) && cached.fetched_at.elapsed() < MIN_REFRESH_INTERVAL)
    }

    /// Google 공개키를 다시 받아 캐시를 교체합니다.
    pub async fn refresh_keys(&self) -> AppResult<()> {
        let KeySource::Remote { certs_url, http } = &self.source else {
            return Ok(());
        };

        let response = http
            .get(certs_url)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 공개키 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Google 공개키 조회 실패: HTTP {}",
                response.status()
            )));
        }

        let ttl = max_age(response.headers()).unwrap_or(DEFAULT_KEYS_TTL);
        let keys = response
            .json::<JwkSet>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google 공개키 파싱 실패: {}", e)))?;

        info!("🔑 Google 공개키 {}개 갱신 (TTL {}초)", keys.keys.len(), ttl.as_secs());

        let now = Instant::now();
        *self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(CachedKeys {
            keys,
            fetched_at: now,
            expires_at: Some(now + ttl),
        });
        Ok(())
    }

    async fn key_for(&self, kid: &str) -> AppResult<Jwk> {
        if let Some(jwk) = self.cached_key(kid) {
            return Ok(jwk);
        }

        // 키 교체 직후일 수 있으니 한 번 다시 받아 봅니다.
        if matches!(self.source, KeySource::Remote { .. }) && !self.recently_fetched() {
            self.refresh_keys().await?;
            if let Some(jwk) = self.cached_key(kid) {
                return Ok(jwk);
            }
        }

        Err(invalid_token("unknown signing key id"))
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> AppResult<GoogleIdentity> {
        let header = decode_header(id_token).map_err(|_| invalid_token("malformed header"))?;
        if header.alg != Algorithm::RS256 {
            return Err(invalid_token("unexpected algorithm"));
        }
        let kid = header.kid.ok_or_else(|| invalid_token("missing kid"))?;

        let jwk = self.key_for(&kid).await?;
        let decoding_key =
            DecodingKey::from_jwk(&jwk).map_err(|_| invalid_token("unusable signing key"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let claims = decode::<GoogleIdTokenClaims>(id_token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => invalid_token("expired"),
                ErrorKind::InvalidAudience => invalid_token("audience mismatch"),
                ErrorKind::InvalidIssuer => invalid_token("issuer mismatch"),
                ErrorKind::InvalidSignature => invalid_token("bad signature"),
                _ => invalid_token(&e.to_string()),
            })?;

        GoogleIdentity::try_from(claims)
    }
}

pub(crate) fn google_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::InternalError(format!("HTTP client build failed: {}", e)))
}

fn init_google_id_token_verifier() -> LocalBoxFuture<'static, AppResult<()>> {
    Box::pin(async {
        let verifier = GoogleIdTokenVerifier::instance()?;
        // 기동 시점에 Google에 닿지 않아도 첫 로그인 때 다시 시도합니다.
        if let Err(e) = verifier.refresh_keys().await {
            warn!("⚠️ Google 공개키 사전 로드 실패: {}", e);
        }
        Ok(())
    })
}

inventory::submit! {
    ServiceRegistration {
        name: "google_id_token_verifier",
        init: init_google_id_token_verifier,
    }
}

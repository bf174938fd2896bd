//! 인증 게이트웨이 서버 진입점
//!
//! 1. `PROFILE`에 따른 `.env.*` 로드, 로깅 초기화
//! 2. `STORAGE_BACKEND`에 따라 MongoDB + Redis 또는 메모리 저장소 구성
//! 3. 서비스 등록 후 시작 훅 실행 (인덱스 생성, Google 공개키 사전 로드)
//! 4. HTTP 서버 기동

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::http::header;
use actix_web::{App, HttpServer, middleware};
use dotenv::dotenv;
use env_logger::Env;
use log::{info, warn};

use auth_gateway_backend::caching::redis::RedisClient;
use auth_gateway_backend::config::{
    CorsConfig, Environment, JwtConfig, OAuthConfig, PasswordConfig, RateLimitConfig, ServerConfig,
};
use auth_gateway_backend::core::errors::{AppError, AppResult};
use auth_gateway_backend::core::registry::ServiceLocator;
use auth_gateway_backend::db::Database;
use auth_gateway_backend::middlewares::security_headers;
use auth_gateway_backend::repositories::tokens::{
    InMemoryRefreshTokenStore, RefreshTokenStore, TokenRepository,
};
use auth_gateway_backend::repositories::users::{InMemoryUserStore, UserRepository, UserStore};
use auth_gateway_backend::routes::configure_all_routes;
use auth_gateway_backend::services::auth::{
    GoogleIdTokenVerifier, GoogleOAuthSettings, TokenSettings,
};
use auth_gateway_backend::services::{ServiceDependencies, register_services};
use auth_gateway_backend::utils::display_terminal::print_server_banner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    fn from_env() -> Self {
        match std::env::var("STORAGE_BACKEND").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            _ => StorageBackend::Mongo,
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let env_file = load_env_file();
    init_logging();
    info!("📄 환경 파일: {}", env_file);

    let environment = Environment::current();
    info!("🚀 인증 게이트웨이 시작중... (environment: {})", environment.as_str());

    bootstrap(&environment).await.map_err(to_io_error)?;

    ServiceLocator::initialize_all().await.map_err(to_io_error)?;
    info!("✅ 모든 서비스가 성공적으로 초기화되었습니다!");

    start_http_server(&environment).await
}

fn to_io_error(e: AppError) -> io::Error {
    io::Error::other(e.to_string())
}

/// 저장소와 서비스를 만들어 ServiceLocator에 등록합니다.
async fn bootstrap(environment: &Environment) -> AppResult<()> {
    JwtConfig::ensure_secret_for(environment)?;
    OAuthConfig::ensure_secret_for(environment)?;

    let backend = StorageBackend::from_env();
    let (user_store, refresh_store) = match backend {
        StorageBackend::Mongo => {
            let (database, redis_client) = initialize_data_stores().await?;
            ServiceLocator::set(database.clone());
            ServiceLocator::set(redis_client.clone());

            let user_repo = Arc::new(UserRepository::new(database, redis_client.clone()));
            ServiceLocator::set(user_repo.clone());

            let user_store: Arc<dyn UserStore> = user_repo;
            let refresh_store: Arc<dyn RefreshTokenStore> =
                Arc::new(TokenRepository::new(redis_client));
            (user_store, refresh_store)
        }
        StorageBackend::Memory => {
            if *environment == Environment::Production {
                return Err(AppError::InternalError(
                    "STORAGE_BACKEND=memory is not allowed in production".to_string(),
                ));
            }
            warn!("⚠️ 메모리 저장소 사용 중: 재시작하면 사용자와 세션이 사라집니다");
            let user_store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
            let refresh_store: Arc<dyn RefreshTokenStore> =
                Arc::new(InMemoryRefreshTokenStore::new());
            (user_store, refresh_store)
        }
    };

    let verifier = Arc::new(GoogleIdTokenVerifier::from_env()?);
    ServiceLocator::set(verifier.clone());

    register_services(ServiceDependencies {
        user_store,
        refresh_store,
        verifier,
        token_settings: TokenSettings::from_env(),
        oauth_settings: GoogleOAuthSettings::from_env()?,
        bcrypt_cost: PasswordConfig::bcrypt_cost(),
    })?;

    Ok(())
}

async fn start_http_server(environment: &Environment) -> io::Result<()> {
    let host = ServerConfig::host();
    let port = ServerConfig::port();

    let rate_limit_config = RateLimitConfig::load();
    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_second(rate_limit_config.per_second)
        .burst_size(rate_limit_config.burst_size)
        .use_headers()
        .finish()
        .ok_or_else(|| io::Error::other("invalid rate limit configuration"))?;

    info!(
        "🛡️ Rate Limiting 활성화: 초당 {}요청, 버스트 {}개",
        rate_limit_config.per_second, rate_limit_config.burst_size
    );

    let allowed_origins = CorsConfig::allowed_origins();
    info!("🌍 CORS 허용 Origin: {:?}", allowed_origins);

    print_server_banner(&host, port, environment.as_str());

    HttpServer::new(move || {
        App::new()
            .wrap(Governor::new(&governor_conf))
            .wrap(configure_cors(&allowed_origins))
            .wrap(security_headers())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_all_routes)
    })
    .bind((host.as_str(), port))?
    .workers(ServerConfig::workers())
    .run()
    .await
}

/// `PROFILE`(dev/prod)에 맞는 env 파일을 읽습니다. 로거 초기화 전이라 결과만 돌려줍니다.
fn load_env_file() -> String {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    let filename = match profile.as_str() {
        "prod" => ".env.prod",
        "dev" => ".env.dev",
        _ => ".env",
    };

    let loaded = if filename == ".env" {
        dotenv().is_ok()
    } else {
        dotenv::from_filename(filename).is_ok()
    };

    if loaded {
        format!("{} 로드 됨 (profile: {})", filename, profile)
    } else {
        format!("{} 없음, 프로세스 환경변수 사용 (profile: {})", filename, profile)
    }
}

fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info,actix_web=info"));
}

async fn initialize_data_stores() -> AppResult<(Arc<Database>, Arc<RedisClient>)> {
    info!("📡 데이터베이스 연결 중...");

    let database = Arc::new(Database::new().await?);
    let redis_client = Arc::new(RedisClient::new().await?);

    Ok((database, redis_client))
}

fn configure_cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        // 리프레시 토큰 쿠키
        .supports_credentials()
        .max_age(3600)
}

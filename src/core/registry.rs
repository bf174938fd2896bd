//! # Service Registry
//!
//! 인프라/리포지토리/서비스 인스턴스를 타입별 싱글톤으로 보관하는 전역 컨테이너입니다.
//!
//! ## 동작 방식
//!
//! ```text
//! 1. main()
//!    ├─ Database, RedisClient 생성 → ServiceLocator::set()
//!    ├─ 리포지토리/서비스 생성 (생성자 주입) → ServiceLocator::set()
//!    └─ ServiceLocator::initialize_all()
//!         ├─ RepositoryRegistration::init  (인덱스 생성 등)
//!         └─ ServiceRegistration::init     (캐시 워밍 등)
//!
//! 2. 요청 처리
//!    └─ XxxService::instance() → ServiceLocator::get::<XxxService>()
//! ```
//!
//! 시작 훅은 각 컴포넌트 파일에서 `inventory::submit!`으로 등록하며,
//! 컴파일 타임에 수집됩니다.
//!
//! ```rust,ignore
//! fn init_user_repository() -> LocalBoxFuture<'static, AppResult<()>> {
//!     Box::pin(async {
//!         ServiceLocator::get::<UserRepository>()?.create_indexes().await
//!     })
//! }
//!
//! inventory::submit! {
//!     RepositoryRegistration { name: "user_repository", init: init_user_repository }
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures_util::future::LocalBoxFuture;
use log::debug;
use once_cell::sync::Lazy;

use crate::core::errors::{AppError, AppResult};
use crate::utils::display_terminal::{
    print_boxed_title, print_final_summary, print_step_complete, print_step_start, print_sub_task,
};

/// 시작 시 실행되는 비동기 초기화 훅
pub type InitHook = fn() -> LocalBoxFuture<'static, AppResult<()>>;

/// 리포지토리 시작 훅 등록 정보
pub struct RepositoryRegistration {
    pub name: &'static str,
    pub init: InitHook,
}

/// 서비스 시작 훅 등록 정보
pub struct ServiceRegistration {
    pub name: &'static str,
    pub init: InitHook,
}

inventory::collect!(RepositoryRegistration);
inventory::collect!(ServiceRegistration);

pub struct ServiceLocator {
    instances: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

static LOCATOR: Lazy<ServiceLocator> = Lazy::new(ServiceLocator::new);

impl ServiceLocator {
    fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// 등록된 인스턴스를 조회합니다.
    ///
    /// # Errors
    ///
    /// 등록되지 않은 타입이면 `AppError::InternalError`
    pub fn get<T: 'static + Send + Sync>() -> AppResult<Arc<T>> {
        let instances = LOCATOR
            .instances
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        instances
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|instance| instance.downcast::<T>().ok())
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "Component not registered: {}",
                    Self::clean_type_name(std::any::type_name::<T>())
                ))
            })
    }

    /// 인스턴스를 등록합니다. 같은 타입이 이미 있으면 교체합니다.
    pub fn set<T: 'static + Send + Sync>(instance: Arc<T>) {
        debug!("📦 Registering: {}", Self::clean_type_name(std::any::type_name::<T>()));

        LOCATOR
            .instances
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(TypeId::of::<T>(), instance as Arc<dyn Any + Send + Sync>);
    }

    pub fn contains<T: 'static + Send + Sync>() -> bool {
        LOCATOR
            .instances
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&TypeId::of::<T>())
    }

    fn clean_type_name(type_name: &str) -> &str {
        type_name.rsplit("::").next().unwrap_or(type_name)
    }

    /// inventory로 수집된 모든 시작 훅을 리포지토리 → 서비스 순으로 실행합니다.
    pub async fn initialize_all() -> AppResult<()> {
        print_boxed_title("🔄 INITIALIZING SERVICE REGISTRY");

        let repositories: Vec<_> = inventory::iter::<RepositoryRegistration>().collect();
        print_step_start(1, "Running repository hooks");
        for registration in &repositories {
            print_sub_task(registration.name, "Initializing...");
            (registration.init)().await?;
            print_sub_task(registration.name, "✓ Ready");
        }
        print_step_complete(1, "Repository hooks finished", repositories.len());

        let services: Vec<_> = inventory::iter::<ServiceRegistration>().collect();
        print_step_start(2, "Running service hooks");
        for registration in &services {
            print_sub_task(registration.name, "Initializing...");
            (registration.init)().await?;
            print_sub_task(registration.name, "✓ Ready");
        }
        print_step_complete(2, "Service hooks finished", services.len());

        print_final_summary(repositories.len(), services.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(u32);
    struct Missing;

    #[test]
    fn test_set_then_get_returns_same_instance() {
        ServiceLocator::set(Arc::new(Marker(7)));

        let marker = ServiceLocator::get::<Marker>().unwrap();
        assert_eq!(marker.0, 7);
        assert!(ServiceLocator::contains::<Marker>());
    }

    #[test]
    fn test_get_unregistered_type_is_internal_error() {
        match ServiceLocator::get::<Missing>() {
            Err(AppError::InternalError(msg)) => assert!(msg.contains("Missing")),
            _ => panic!("Expected InternalError"),
        }
    }
}

//! JWT 인증 미들웨어
//!
//! `Authorization: Bearer <access_token>`을 검증하고, 성공하면
//! [`AuthenticatedUser`](crate::domain::models::auth::AuthenticatedUser)를
//! 요청 확장에 넣습니다. 핸들러는 extractor로 꺼내 씁니다.

use std::future::{Ready, ready};
use std::rc::Rc;

use actix_web::{
    Error, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
};

use crate::middlewares::auth_inner::AuthMiddlewareService;

/// 토큰이 없거나 잘못됐을 때의 처리 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// 401로 즉시 응답
    Required,
    /// 사용자 정보 없이 핸들러로 진행
    Optional,
}

#[derive(Debug, Clone)]
pub enum RequiredRole {
    Single(String),
    /// 나열된 역할 중 하나
    Any(Vec<String>),
}

impl RequiredRole {
    pub fn is_satisfied(&self, roles: &[String]) -> bool {
        match self {
            RequiredRole::Single(required) => roles.iter().any(|role| role == required),
            RequiredRole::Any(required) => required.iter().any(|r| roles.contains(r)),
        }
    }
}

pub struct AuthMiddleware {
    mode: AuthMode,
    required_role: Option<RequiredRole>,
}

impl AuthMiddleware {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            required_role: None,
        }
    }

    pub fn new_with_role(mode: AuthMode, required_role: RequiredRole) -> Self {
        Self {
            mode,
            required_role: Some(required_role),
        }
    }

    pub fn required() -> Self {
        Self::new(AuthMode::Required)
    }

    pub fn optional() -> Self {
        Self::new(AuthMode::Optional)
    }

    pub fn required_with_role(role: &str) -> Self {
        Self::new_with_role(AuthMode::Required, RequiredRole::Single(role.to_string()))
    }

    pub fn required_with_roles(roles: &[&str]) -> Self {
        let roles = roles.iter().map(|role| role.to_string()).collect();
        Self::new_with_role(AuthMode::Required, RequiredRole::Any(roles))
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            mode: self.mode,
            required_role: self.required_role.clone(),
        }))
    }
}

//! 저장되지 않는 도메인 모델 (토큰, 인증 컨텍스트, 외부 신원)

pub mod auth;
pub mod oauth;
pub mod token;

//! # Domain
//!
//! - [`entities`] - MongoDB에 저장되는 엔티티 (`User`)
//! - [`dto`] - HTTP 요청/응답 본문
//! - [`models`] - 토큰, 인증 컨텍스트, Google 신원처럼 저장되지 않는 모델

pub mod dto;
pub mod entities;
pub mod models;

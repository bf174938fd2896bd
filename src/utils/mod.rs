//! 공통 유틸리티 모듈
//!
//! - [`display_terminal`] - 기동 과정 터미널 출력

pub mod display_terminal;

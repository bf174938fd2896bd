//! # Core
//!
//! 에러 타입([`errors`])과 전역 컴포넌트 레지스트리([`registry`])를 제공합니다.

pub mod errors;
pub mod registry;

pub use errors::*;
pub use registry::*;

//! # Repositories
//!
//! 저장소 접근 계층입니다. 서비스는 [`users::UserStore`], [`tokens::RefreshTokenStore`]
//! trait에만 의존하며, 구현은 `main`에서 저장소 백엔드 설정에 따라 선택됩니다.
//!
//! | trait | 운영 구현 | 메모리 구현 |
//! |-------|-----------|-------------|
//! | `UserStore` | `UserRepository` (MongoDB + Redis 캐시) | `InMemoryUserStore` |
//! | `RefreshTokenStore` | `TokenRepository` (Redis) | `InMemoryRefreshTokenStore` |

pub mod tokens;
pub mod users;

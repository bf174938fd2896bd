//! 캐싱 계층 모듈
//!
//! Redis 연결과 JSON 직렬화 헬퍼를 제공합니다. 리프레시 토큰 저장소와
//! 사용자 조회 캐시가 이 클라이언트를 공유합니다.
//!
//! ```bash
//! REDIS_URL=redis://localhost:6379  # 기본값
//! ```

pub mod redis;

pub mod token;

pub use token::{ACCESS_TOKEN_TYPE, RefreshTokenRecord, SessionCredential, TokenClaims};

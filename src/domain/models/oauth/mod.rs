pub mod google_identity;

pub use google_identity::{GoogleIdTokenClaims, GoogleIdentity};

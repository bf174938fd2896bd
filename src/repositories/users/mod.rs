pub mod user_repo;
pub mod user_store;

pub use user_repo::UserRepository;
pub use user_store::{InMemoryUserStore, ProfileUpdate, UserStore};

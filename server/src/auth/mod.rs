mod crypto;
mod db;
mod extractor;

pub use crypto::{hash_password, verify_password, PasswordCheck};
pub use db::{create_session, delete_session};
pub use extractor::{bearer_token, AuthUser, MaybeAuthUser};

//! Session tokens and password hashes.

use argon2::{
    password_hash::{
        rand_core::OsRng as SaltRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// Fast, weak argon2 parameters for dev and test databases.
static INSECURE_HASHING: LazyLock<bool> =
    LazyLock::new(|| std::env::var("INSECURE_PASSWORD_HASHING").is_ok());

/// A fresh bearer token. Only `hash` is stored; `token` goes to the client once.
pub struct IssuedToken {
    pub token: String,
    pub hash: String,
}

pub fn issue_token() -> IssuedToken {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let hash = hash_token(&token);
    IssuedToken { token, hash }
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn current_params() -> Params {
    if *INSECURE_HASHING {
        Params::new(1024, 1, 1, None).unwrap_or_default()
    } else {
        Params::default()
    }
}

fn argon2() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, current_params())
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut SaltRng);
    let hash = argon2().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Invalid,
    /// Correct password. `rehash` is set when the stored hash was made with
    /// different cost parameters than the server now uses.
    Valid { rehash: bool },
}

pub fn verify_password(password: &str, stored: &str) -> PasswordCheck {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return PasswordCheck::Invalid;
    };
    // Verification reads the cost parameters from the stored hash itself.
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return PasswordCheck::Invalid;
    }

    let current = current_params();
    let rehash = match Params::try_from(&parsed) {
        Ok(stored) => {
            stored.m_cost() != current.m_cost()
                || stored.t_cost() != current.t_cost()
                || stored.p_cost() != current.p_cost()
        }
        Err(_) => true,
    };
    PasswordCheck::Valid { rehash }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_check() {
        let hash = hash_password("hunter2").unwrap();
        assert_eq!(
            verify_password("hunter2", &hash),
            PasswordCheck::Valid { rehash: false }
        );
        assert_eq!(verify_password("hunter3", &hash), PasswordCheck::Invalid);
        assert_eq!(
            verify_password("hunter2", "not a phc string"),
            PasswordCheck::Invalid
        );
    }

    #[test]
    fn test_hash_with_other_costs_wants_rehash() {
        let weak = Params::new(2048, 1, 1, None).unwrap();
        let salt = SaltString::generate(&mut SaltRng);
        let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, weak)
            .hash_password(b"hunter2", &salt)
            .unwrap()
            .to_string();
        assert_eq!(
            verify_password("hunter2", &hash),
            PasswordCheck::Valid { rehash: true }
        );
    }

    #[test]
    fn test_issued_tokens_are_unique_and_hashed() {
        let a = issue_token();
        let b = issue_token();
        assert_eq!(a.token.len(), 64);
        assert_ne!(a.token, b.token);
        assert_eq!(a.hash, hash_token(&a.token));
        assert_ne!(a.hash, a.token);
    }
}

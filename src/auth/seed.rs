//! Synthetic credentials for load-testing and demos.
//!
//! Seeded user `n` logs in as `user{n}@example.com` with the lowercase hex
//! SHA-256 of `password{n}`, so benchmark clients can derive any credential
//! pair without talking to the server.

use sha2::{Digest, Sha256};

pub fn username_for(n: u64) -> String {
    format!("user{n}@example.com")
}

pub fn password_for(n: u64) -> String {
    format!("password{n}")
}

pub fn password_hash_for(n: u64) -> String {
    hex::encode(Sha256::digest(password_for(n).as_bytes()))
}

/// One generated credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub password_hash: String,
}

impl SeedUser {
    pub fn numbered(n: u64) -> Self {
        Self {
            username: username_for(n),
            password_hash: password_hash_for(n),
        }
    }
}

/// Yields `count` users numbered from `start`.
pub fn generate(start: u64, count: u64) -> impl Iterator<Item = SeedUser> {
    (start..start + count).map(SeedUser::numbered)
}

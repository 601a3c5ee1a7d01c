//! Password and session-token hashing.
//!
//! Passwords are stored as `salt$hex(sha256(app_salt || salt || password))`.
//! Session tokens are stored only as `hash_secret(token)`.

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const APP_SALT: &[u8] = b"gpucrm-v1:";
const PASSWORD_SALT_BYTES: usize = 16;
const SESSION_TOKEN_BYTES: usize = 32;

/// Prefix that marks a bearer token as a CRM session token.
pub const SESSION_TOKEN_PREFIX: &str = "crm_";

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a secret for database lookups (session tokens).
/// Uses SHA-256 with application salt, returns lowercase hex string.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(APP_SALT);
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

fn salted_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(APP_SALT);
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn hash_password(password: &str) -> String {
    let salt = random_hex(PASSWORD_SALT_BYTES);
    let digest = salted_digest(&salt, password);
    format!("{}${}", salt, digest)
}

/// Constant-time check of `password` against a stored `salt$digest` value.
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let actual = salted_digest(salt, password);
    actual.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// New random session token: `crm_` followed by 64 hex characters.
pub fn generate_session_token() -> String {
    format!("{}{}", SESSION_TOKEN_PREFIX, random_hex(SESSION_TOKEN_BYTES))
}

//! Login, logout and session-to-actor resolution.
//!
//! Sessions are opaque bearer tokens. Only `hash_secret(token)` is stored,
//! next to the actor's role, team and department as of login. A session
//! lives until logout, or until its user is deleted, disabled or reassigned.

use rusqlite::Connection;
use thiserror::Error;

use crate::crypto::{generate_session_token, hash_secret, verify_password};
use crate::db::queries;
use crate::error::AppError;
use crate::models::{Actor, Session, User};

/// Checks a password against a stored user. The default implementation
/// compares against the salted hash in the users table; deployments that
/// delegate authentication elsewhere plug in their own.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, user: &User, password: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoredPasswordVerifier;

impl CredentialVerifier for StoredPasswordVerifier {
    fn verify(&self, user: &User, password: &str) -> bool {
        verify_password(password, &user.password_hash)
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is disabled")]
    Disabled,

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::Disabled => AppError::Unauthorized,
            AuthError::Storage(e) => e,
        }
    }
}

/// A successful login: the raw token (shown once) and the actor snapshot.
#[derive(Debug, Clone)]
pub struct Login {
    pub token: String,
    pub actor: Actor,
    pub user: User,
}

pub fn login(
    conn: &Connection,
    verifier: &dyn CredentialVerifier,
    username: &str,
    password: &str,
) -> Result<Login, AuthError> {
    // Deleted users are excluded by the lookup itself
    let user = queries::get_user_by_username(conn, username)?.ok_or(AuthError::InvalidCredentials)?;

    if !verifier.verify(&user, password) {
        return Err(AuthError::InvalidCredentials);
    }
    if !user.is_enabled() {
        return Err(AuthError::Disabled);
    }

    let actor = Actor::from(&user);
    let token = generate_session_token();
    queries::create_session(conn, &hash_secret(&token), &actor)?;

    Ok(Login { token, actor, user })
}

/// Revoke a session. Returns false if it was already gone.
pub fn logout(conn: &Connection, token: &str) -> Result<bool, AppError> {
    queries::delete_session(conn, &hash_secret(token))
}

/// Resolve a bearer token to the actor captured at login and the current
/// user row.
///
/// Returns None for unknown tokens. A session whose user has been deleted or
/// disabled is revoked on the spot and also yields None.
pub fn resolve_actor(conn: &Connection, token: &str) -> Result<Option<(Actor, User)>, AppError> {
    let token_hash = hash_secret(token);
    let Some(Session { actor, user }) = queries::get_session(conn, &token_hash)? else {
        return Ok(None);
    };

    if !user.is_enabled() {
        tracing::info!(user_id = %user.id, "revoking session of deleted or disabled user");
        queries::delete_sessions_for_user(conn, &user.id)?;
        return Ok(None);
    }

    queries::touch_session(conn, &token_hash)?;
    Ok(Some((actor, user)))
}

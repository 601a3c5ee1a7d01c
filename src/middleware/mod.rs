mod actor_auth;

pub use actor_auth::*;

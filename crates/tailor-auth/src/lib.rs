//! Session credentials for the tailor shop API
//!
//! Owns everything the gateway needs to know about credentials: where they
//! live (`store::KeyValueStore`), which keys hold them (`constants`), how a
//! pair is read, rotated and purged (`credentials`), and the wire call that
//! exchanges a refresh token for a new pair (`token::refresh_token`).
//!
//! Credential flow:
//! 1. Login screen stores the initial pair via `credentials::save_pair()`
//! 2. Gateway reads the access token for each attempt via `credentials::access_token()`
//! 3. On a 401 the gateway calls `token::refresh_token()` with the stored refresh token
//! 4. Success rotates both tokens via `credentials::save_pair()`
//! 5. Rejection wipes the session via `credentials::purge()`

pub mod constants;
pub mod credentials;
pub mod error;
pub mod store;
pub mod token;

pub use constants::*;
pub use credentials::CredentialPair;
pub use error::{Error, Result};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreFuture};
pub use token::{TokenPair, refresh_token};

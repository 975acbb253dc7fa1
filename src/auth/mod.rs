//! Authentication building blocks for the gateway.
//!
//! Provides:
//! - Password digests (argon2id PHC strings, salted, tunable work factor)
//! - Signed, self-contained bearer tokens (HS256, 24h embedded expiry)
//!
//! ## Design Decisions
//! - Tokens carry `{id, email, role}` plus issue/expiry timestamps, so the
//!   gateway validates them without a store lookup on every request.
//! - Deleting a session row does NOT invalidate an outstanding token before
//!   its embedded expiry — revocation is advisory only.

pub mod password;
pub mod token;

pub use token::{Claims, TokenIssuer, DEFAULT_TOKEN_TTL_SECS};

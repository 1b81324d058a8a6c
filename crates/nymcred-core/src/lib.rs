//! Shared leaf types for the nymcred credential engine.
//!
//! Typed identifiers, the role/usage vocabulary, the storage and
//! identity-source capability traits, and content-derived credential ID
//! computation. Everything here is serialization-friendly and free of
//! key material.

pub mod crypto;
pub mod error;
pub mod traits;
pub mod types;

pub use crypto::*;
pub use error::*;
pub use traits::*;
pub use types::*;

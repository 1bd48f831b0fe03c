//! Domain primitives shared by the store and the API layer.
//!
//! - [`token`] -- signing and verification of access / refresh tokens.
//! - [`password`] -- deterministic credential hashing.
//! - [`validation`] -- sign-up input rules.
//! - [`clock`] -- injectable time source.

pub mod clock;
pub mod env;
pub mod error;
pub mod password;
pub mod token;
pub mod types;
pub mod validation;

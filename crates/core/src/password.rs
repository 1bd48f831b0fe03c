//! Argon2id credential hashing and password strength validation.
//!
//! Sign-in looks users up by `(username, password_hash)`, so hashing must be
//! deterministic: every hash uses the same process-wide salt, and an optional
//! secret ("pepper") keys the hash so a leaked table cannot be attacked
//! without the server configuration. The PHC string format is stored.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::HashError;

/// Turns a plaintext password into a comparable opaque string.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;
}

/// Deterministic Argon2id hasher keyed by a fixed salt and optional pepper.
pub struct Argon2Hasher {
    salt: SaltString,
    pepper: Option<Vec<u8>>,
    params: Params,
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("peppered", &self.pepper.is_some())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Argon2Hasher {
    /// Build a hasher from a base64 (unpadded) salt and an optional pepper,
    /// using the default Argon2id cost parameters.
    pub fn new(salt_b64: &str, pepper: Option<&str>) -> Result<Self, HashError> {
        let salt =
            SaltString::from_b64(salt_b64).map_err(|e| HashError::Config(e.to_string()))?;
        Ok(Self {
            salt,
            pepper: pepper.map(|p| p.as_bytes().to_vec()),
            params: Params::default(),
        })
    }

    /// Replace the cost parameters (memory KiB, iterations, lanes).
    pub fn with_cost(mut self, m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        self.params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| HashError::Config(e.to_string()))?;
        Ok(self)
    }

    fn argon2(&self) -> Result<Argon2<'_>, HashError> {
        match &self.pepper {
            Some(pepper) => Argon2::new_with_secret(
                pepper,
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )
            .map_err(|e| HashError::Config(e.to_string())),
            None => Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )),
        }
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let hash = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &self.salt)
            .map_err(|e| HashError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }
}

/// Validate that a password meets minimum strength requirements.
///
/// Currently enforces a minimum character length. Returns `Ok(())` when the
/// password is acceptable, or `Err` with a human-readable explanation.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {min_length} characters long"
        ));
    }
    Ok(())
}

//! Sign-up input rules.

use serde::Deserialize;
use validator::Validate;

use crate::password::validate_password_strength;
use crate::types::DbId;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LENGTH: u64 = 64;

/// Account details submitted at sign-up.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignUpInput {
    #[validate(length(min = 1, max = MAX_USERNAME_LENGTH))]
    pub username: String,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub avatar_id: Option<DbId>,
}

impl SignUpInput {
    /// Trim the username and drop a blank e-mail.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self
    }

    /// Check field rules and password strength.
    ///
    /// The error message names every offending field.
    pub fn check(&self, min_password_length: usize) -> Result<(), String> {
        let mut fields: Vec<String> = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect(),
        };
        fields.sort();

        if !fields.is_empty() {
            return Err(format!("Invalid fields: {}", fields.join(", ")));
        }
        validate_password_strength(&self.password, min_password_length)
    }
}

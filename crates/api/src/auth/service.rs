//! The authentication protocol: sign-up, sign-in, refresh, access validation,
//! logout, and session listing.
//!
//! Each refresh token carries the session's rotation token. A refresh only
//! succeeds while that value is still the one on the session row, and every
//! success replaces it, so a refresh token can be redeemed exactly once.
//! Access validation round-trips to the store, which makes logout revoke
//! outstanding access tokens immediately.

use std::sync::Arc;

use authd_core::clock::Clock;
use authd_core::env;
use authd_core::error::ConfigError;
use authd_core::password::CredentialHasher;
use authd_core::token::{AccessClaims, ClaimSubject, TokenCodec, TokenPair};
use authd_core::types::{DbId, SessionKey};
use authd_core::validation::SignUpInput;
use authd_db::models::session::SessionDetails;
use authd_db::models::user::NewUser;
use authd_db::store::USERNAME_CONSTRAINT;
use authd_db::{AuthStore, RotationOutcome};
use tracing::Span;
use uuid::Uuid;

use super::error::{AuthError, AuthResult};
use super::sessions::{ClientMeta, SessionManager};
use crate::telemetry::SECURITY_TARGET;

/// Account policy applied at sign-up.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Minimum password length in characters.
    pub min_password_length: usize,
    /// Role assigned to new accounts.
    pub default_role_id: DbId,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            min_password_length: 1,
            default_role_id: 0,
        }
    }
}

impl AuthSettings {
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `AUTH_MIN_PASSWORD_LENGTH` | `1`     |
    /// | `AUTH_DEFAULT_ROLE_ID`     | `0`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            min_password_length: env::parse_or(
                "AUTH_MIN_PASSWORD_LENGTH",
                defaults.min_password_length,
            )?,
            default_role_id: env::parse_or("AUTH_DEFAULT_ROLE_ID", defaults.default_role_id)?,
        })
    }
}

/// Composes the store, the hasher, and the token codec into the public
/// authentication operations.
pub struct AuthService {
    store: Arc<dyn AuthStore>,
    sessions: SessionManager,
    hasher: Arc<dyn CredentialHasher>,
    codec: TokenCodec,
    settings: AuthSettings,
    span: Span,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AuthStore>,
        hasher: Arc<dyn CredentialHasher>,
        codec: TokenCodec,
        settings: AuthSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions: SessionManager::new(Arc::clone(&store), clock),
            store,
            hasher,
            codec,
            settings,
            span: tracing::info_span!("auth"),
        }
    }

    /// Parent every operation span under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Register a new account and return its id.
    #[tracing::instrument(parent = &self.span, skip_all, fields(username = %input.username))]
    pub async fn sign_up(&self, input: SignUpInput) -> AuthResult<DbId> {
        let input = input.normalized();
        input
            .check(self.settings.min_password_length)
            .map_err(AuthError::Validation)?;

        let user = NewUser {
            password_hash: self.hasher.hash(&input.password)?,
            username: input.username,
            email: input.email,
            role_id: self.settings.default_role_id,
            avatar_id: input.avatar_id.unwrap_or_default(),
        };

        match self.store.insert_user(&user).await {
            Ok(id) => {
                tracing::info!(user_id = id, "User signed up");
                Ok(id)
            }
            Err(err) if err.violates(USERNAME_CONSTRAINT) => {
                tracing::debug!("Username already taken");
                Err(AuthError::DuplicateUsername)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Check credentials and open a new session.
    ///
    /// An unknown username and a wrong password produce the same
    /// [`AuthError::InvalidCredentials`].
    #[tracing::instrument(parent = &self.span, skip_all, fields(username = %username))]
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
        client: &ClientMeta,
    ) -> AuthResult<TokenPair> {
        let password_hash = self.hasher.hash(password)?;
        let Some(user) = self
            .store
            .get_user_by_credentials(username.trim(), &password_hash)
            .await?
        else {
            tracing::debug!("Sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let ordinal = self
            .sessions
            .next_ordinal(user.id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let rotation = Uuid::new_v4().to_string();
        let subject = ClaimSubject {
            user_id: user.id,
            username: &user.username,
            role_id: user.role_id,
            session_id: ordinal,
        };
        let pair = self
            .codec
            .issue_pair(&subject, &rotation)
            .map_err(AuthError::issuing)?;

        self.sessions
            .create_session(user.id, ordinal, &pair.refresh_token, &rotation, client)
            .await?;

        tracing::info!(user_id = user.id, session_id = ordinal, "Session created");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair bound to the same session.
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.codec.decode_refresh(refresh_token).map_err(|err| {
            tracing::debug!(error = %err, "Refresh token rejected");
            AuthError::rejected(err)
        })?;
        let key = claims.session_key();

        let user = self
            .store
            .get_user_by_id(claims.user_id)
            .await?
            .ok_or_else(|| AuthError::Unauthenticated("user no longer exists".into()))?;
        let session = self
            .sessions
            .lookup_by_id(key)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        // Cheap early exit; the store repeats this comparison under lock.
        if session.refresh_uuid != claims.refresh_uuid {
            report_reuse(key);
            return Err(AuthError::TokenReuseDetected);
        }

        let rotation = Uuid::new_v4().to_string();
        let subject = ClaimSubject {
            user_id: user.id,
            username: &user.username,
            role_id: user.role_id,
            session_id: key.session_id,
        };
        let pair = self
            .codec
            .issue_pair(&subject, &rotation)
            .map_err(AuthError::issuing)?;

        match self
            .sessions
            .rotate(&session, &claims.refresh_uuid, &pair.refresh_token, &rotation)
            .await?
        {
            RotationOutcome::Rotated(_) => {
                tracing::debug!(session = %key, "Session rotated");
                Ok(pair)
            }
            RotationOutcome::Stale => {
                report_reuse(key);
                Err(AuthError::TokenReuseDetected)
            }
            RotationOutcome::Missing => Err(AuthError::SessionNotFound),
        }
    }

    /// Verify an access token and confirm its session is still live.
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn validate_access(&self, access_token: &str) -> AuthResult<AccessClaims> {
        let claims = self.codec.decode_access(access_token).map_err(|err| {
            tracing::debug!(error = %err, "Access token rejected");
            AuthError::rejected(err)
        })?;

        if self.sessions.lookup_by_id(claims.session_key()).await?.is_none() {
            tracing::debug!(
                user_id = claims.user_id,
                session_id = claims.session_id,
                "Access token for ended session"
            );
            return Err(AuthError::Unauthenticated("session has ended".into()));
        }
        Ok(claims)
    }

    /// End the session the access token belongs to.
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn logout(&self, access_token: &str) -> AuthResult<()> {
        let claims = self.validate_access(access_token).await?;
        let key = claims.session_key();

        // A concurrent logout may have won the race since validation.
        if !self.sessions.terminate(key).await? {
            return Err(AuthError::Unauthenticated("session has ended".into()));
        }
        tracing::info!(session = %key, "Session terminated");
        Ok(())
    }

    /// Live sessions of the token's owner, with client and application details.
    #[tracing::instrument(parent = &self.span, skip_all)]
    pub async fn list_sessions(&self, access_token: &str) -> AuthResult<Vec<SessionDetails>> {
        let claims = self.validate_access(access_token).await?;
        Ok(self.sessions.details_by_user(claims.user_id).await?)
    }
}

fn report_reuse(key: SessionKey) {
    tracing::warn!(
        target: SECURITY_TARGET,
        user_id = key.user_id,
        session_id = key.session_id,
        "Refresh token reuse detected"
    );
}

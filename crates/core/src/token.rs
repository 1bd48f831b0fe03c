//! Access / refresh token issuance and verification.
//!
//! Both token kinds are HMAC-signed JWTs. An access token carries a unique
//! `jti`; a refresh token instead carries the session's current rotation
//! token (`refresh_uuid`). The claim structs reject unknown fields, so a
//! refresh token can never be decoded as an access token or vice versa.
//!
//! Expiry is checked against an injected [`Clock`] rather than the system
//! time, with zero leeway.

use std::str::FromStr;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::clock::Clock;
use crate::env;
use crate::error::{ConfigError, TokenError};
use crate::types::{DbId, SessionKey};

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_TTL_MINS: i64 = 15;
/// Default refresh token lifetime in hours (30 days).
pub const DEFAULT_REFRESH_TTL_HOURS: i64 = 720;

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// The supported signing algorithms. Only the HMAC family is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HmacAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl HmacAlgorithm {
    /// The `alg` header value.
    pub fn name(self) -> &'static str {
        match self {
            HmacAlgorithm::HS256 => "HS256",
            HmacAlgorithm::HS384 => "HS384",
            HmacAlgorithm::HS512 => "HS512",
        }
    }
}

impl From<HmacAlgorithm> for Algorithm {
    fn from(alg: HmacAlgorithm) -> Self {
        match alg {
            HmacAlgorithm::HS256 => Algorithm::HS256,
            HmacAlgorithm::HS384 => Algorithm::HS384,
            HmacAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

impl FromStr for HmacAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(HmacAlgorithm::HS256),
            "HS384" => Ok(HmacAlgorithm::HS384),
            "HS512" => Ok(HmacAlgorithm::HS512),
            _ => Err(TokenError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Signing key, claim constants, and token lifetimes.
#[derive(Clone)]
pub struct TokenConfig {
    /// Shared HMAC secret used to sign and verify tokens.
    pub signing_key: String,
    /// Value of the `iss` claim.
    pub issuer: String,
    /// Value of the `aud` claim.
    pub audience: String,
    pub algorithm: HmacAlgorithm,
    /// Access token lifetime in minutes.
    pub access_token_ttl_mins: i64,
    /// Refresh token lifetime in hours.
    pub refresh_token_ttl_hours: i64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl_mins", &self.access_token_ttl_mins)
            .field("refresh_token_ttl_hours", &self.refresh_token_ttl_hours)
            .finish()
    }
}

impl TokenConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var                        | Required | Default      |
    /// |--------------------------------|----------|--------------|
    /// | `AUTH_SIGNING_KEY`             | **yes**  | --           |
    /// | `AUTH_ISSUER`                  | no       | `authd`      |
    /// | `AUTH_AUDIENCE`                | no       | `authd`      |
    /// | `AUTH_JWT_ALGORITHM`           | no       | `HS256`      |
    /// | `AUTH_ACCESS_TOKEN_TTL_MINS`   | no       | `15`         |
    /// | `AUTH_REFRESH_TOKEN_TTL_HOURS` | no       | `720`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        let signing_key = env::require("AUTH_SIGNING_KEY")?;
        let issuer = env::optional("AUTH_ISSUER").unwrap_or_else(|| "authd".into());
        let audience = env::optional("AUTH_AUDIENCE").unwrap_or_else(|| "authd".into());
        let algorithm = env::parse_or("AUTH_JWT_ALGORITHM", HmacAlgorithm::default())?;
        let access_token_ttl_mins =
            env::parse_or("AUTH_ACCESS_TOKEN_TTL_MINS", DEFAULT_ACCESS_TTL_MINS)?;
        let refresh_token_ttl_hours =
            env::parse_or("AUTH_REFRESH_TOKEN_TTL_HOURS", DEFAULT_REFRESH_TTL_HOURS)?;

        if access_token_ttl_mins <= 0 {
            return Err(ConfigError::Invalid {
                var: "AUTH_ACCESS_TOKEN_TTL_MINS",
                reason: "must be positive".into(),
            });
        }
        if refresh_token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "AUTH_REFRESH_TOKEN_TTL_HOURS",
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            signing_key,
            issuer,
            audience,
            algorithm,
            access_token_ttl_mins,
            refresh_token_ttl_hours,
        })
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessClaims {
    pub iss: String,
    pub aud: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
    pub user_id: DbId,
    pub username: String,
    pub role_id: DbId,
    pub session_id: DbId,
}

/// Claims embedded in every refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub user_id: DbId,
    pub username: String,
    pub role_id: DbId,
    pub session_id: DbId,
    /// The session's rotation token at the time of issuance.
    pub refresh_uuid: String,
}

impl AccessClaims {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.user_id, self.session_id)
    }
}

impl RefreshClaims {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::new(self.user_id, self.session_id)
    }
}

/// A claim set the codec knows how to decode.
///
/// Callers pick the expected shape; decoding fails closed if the token
/// carries the other one.
pub trait TokenShape: DeserializeOwned + private::Sealed {
    fn expires_at(&self) -> i64;
}

impl TokenShape for AccessClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

impl TokenShape for RefreshClaims {
    fn expires_at(&self) -> i64 {
        self.exp
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::AccessClaims {}
    impl Sealed for super::RefreshClaims {}
}

/// Identity fields copied into both claim sets.
#[derive(Debug, Clone, Copy)]
pub struct ClaimSubject<'a> {
    pub user_id: DbId,
    pub username: &'a str,
    pub role_id: DbId,
    pub session_id: DbId,
}

/// An issued access / refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Stateless signer / verifier keyed by the shared signing secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: HmacAlgorithm,
    issuer: String,
    audience: String,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(config.algorithm.into());
        // Expiry is checked against the injected clock after decoding.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_key.as_bytes()),
            algorithm: config.algorithm,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: chrono::Duration::minutes(config.access_token_ttl_mins),
            refresh_ttl: chrono::Duration::hours(config.refresh_token_ttl_hours),
            validation,
            clock,
        }
    }

    /// Override the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Override the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Access token lifetime in whole seconds.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub fn issue_access(&self, subject: &ClaimSubject<'_>) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = AccessClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + self.access_ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            user_id: subject.user_id,
            username: subject.username.to_string(),
            role_id: subject.role_id,
            session_id: subject.session_id,
        };
        self.sign(&claims)
    }

    pub fn issue_refresh(
        &self,
        subject: &ClaimSubject<'_>,
        rotation_token: &str,
    ) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = RefreshClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + self.refresh_ttl).timestamp(),
            iat: now.timestamp(),
            user_id: subject.user_id,
            username: subject.username.to_string(),
            role_id: subject.role_id,
            session_id: subject.session_id,
            refresh_uuid: rotation_token.to_string(),
        };
        self.sign(&claims)
    }

    /// Issue an access token and a refresh token bound to `rotation_token`.
    pub fn issue_pair(
        &self,
        subject: &ClaimSubject<'_>,
        rotation_token: &str,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject)?,
            refresh_token: self.issue_refresh(subject, rotation_token)?,
            expires_in: self.access_ttl_secs(),
        })
    }

    pub fn decode_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.decode(token)
    }

    pub fn decode_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.decode(token)
    }

    /// Verify `token` and decode it as the claim shape `C`.
    pub fn decode<C: TokenShape>(&self, token: &str) -> Result<C, TokenError> {
        self.check_algorithm(token)?;

        let data = jsonwebtoken::decode::<C>(token, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;

        if data.claims.expires_at() <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        encode(
            &Header::new(self.algorithm.into()),
            claims,
            &self.encoding_key,
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Reject anything other than the configured HMAC variant before the
    /// signature is looked at. `none` tokens end up here.
    fn check_algorithm(&self, token: &str) -> Result<(), TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(_), Some(_), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        let raw = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| TokenError::Malformed)?;
        let header: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;
        let alg = header
            .get("alg")
            .and_then(|v| v.as_str())
            .ok_or(TokenError::Malformed)?;

        if alg != self.algorithm.name() {
            return Err(TokenError::UnsupportedAlgorithm(alg.to_string()));
        }
        Ok(())
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            TokenError::UnsupportedAlgorithm(err.to_string())
        }
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidIssuer => TokenError::ClaimMismatch("iss"),
        ErrorKind::InvalidAudience => TokenError::ClaimMismatch("aud"),
        _ => TokenError::Malformed,
    }
}

/// SHA-256 hex digest of a refresh token, as stored on the session row.
pub fn digest_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::clock::ManualClock;

    /// Helper to build a test config with a known secret.
    fn test_config() -> TokenConfig {
        TokenConfig {
            signing_key: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: "authd-test".to_string(),
            audience: "authd-clients".to_string(),
            algorithm: HmacAlgorithm::HS256,
            access_token_ttl_mins: 15,
            refresh_token_ttl_hours: 24,
        }
    }

    fn subject() -> ClaimSubject<'static> {
        ClaimSubject {
            user_id: 7,
            username: "alice",
            role_id: 0,
            session_id: 3,
        }
    }

    fn codec_with_clock() -> (TokenCodec, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (TokenCodec::new(&test_config(), clock.clone()), clock)
    }

    fn b64(json: serde_json::Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json).unwrap())
    }

    #[test]
    fn test_issue_and_decode_access_token() {
        let (codec, clock) = codec_with_clock();
        let token = codec.issue_access(&subject()).expect("issue should succeed");

        let claims = codec.decode_access(&token).expect("decode should succeed");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.session_id, 3);
        assert_eq!(claims.iss, "authd-test");
        assert_eq!(claims.aud, "authd-clients");
        assert_eq!(claims.iat, clock.now().timestamp());
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_issue_and_decode_refresh_token() {
        let (codec, _) = codec_with_clock();
        let token = codec
            .issue_refresh(&subject(), "rotation-1")
            .expect("issue should succeed");

        let claims = codec.decode_refresh(&token).expect("decode should succeed");
        assert_eq!(claims.refresh_uuid, "rotation-1");
        assert_eq!(claims.session_key(), SessionKey::new(7, 3));
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_each_access_token_has_a_unique_id() {
        let (codec, _) = codec_with_clock();
        let a = codec.decode_access(&codec.issue_access(&subject()).unwrap()).unwrap();
        let b = codec.decode_access(&codec.issue_access(&subject()).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_shapes_do_not_cross_decode() {
        let (codec, _) = codec_with_clock();
        let pair = codec.issue_pair(&subject(), "rotation-1").unwrap();

        assert_matches!(
            codec.decode_refresh(&pair.access_token),
            Err(TokenError::Malformed)
        );
        assert_matches!(
            codec.decode_access(&pair.refresh_token),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn test_expired_token_fails() {
        let (codec, clock) = codec_with_clock();
        let codec = codec.with_access_ttl(chrono::Duration::seconds(1));
        let token = codec.issue_access(&subject()).unwrap();

        clock.advance(chrono::Duration::seconds(2));
        assert_matches!(codec.decode_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_expires_exactly_at_exp() {
        let (codec, clock) = codec_with_clock();
        let codec = codec.with_access_ttl(chrono::Duration::seconds(10));
        let token = codec.issue_access(&subject()).unwrap();

        clock.advance(chrono::Duration::seconds(9));
        assert!(codec.decode_access(&token).is_ok());

        clock.advance(chrono::Duration::seconds(1));
        assert_matches!(codec.decode_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_different_secrets_fail() {
        let (codec_a, clock) = codec_with_clock();
        let mut other = test_config();
        other.signing_key = "secret-bravo".to_string();
        let codec_b = TokenCodec::new(&other, clock);

        let token = codec_a.issue_access(&subject()).unwrap();
        assert_matches!(
            codec_b.decode_access(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_fails_signature_check() {
        let (codec, _) = codec_with_clock();
        let token = codec.issue_access(&subject()).unwrap();
        let claims = codec.decode_access(&token).unwrap();

        let mut forged = serde_json::to_value(&claims).unwrap();
        forged["user_id"] = serde_json::json!(1);
        let parts: Vec<&str> = token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], b64(forged), parts[2]);

        assert_matches!(
            codec.decode_access(&tampered),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_none_algorithm_is_rejected() {
        let (codec, _) = codec_with_clock();
        let token = codec.issue_access(&subject()).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        let header = b64(serde_json::json!({ "alg": "none", "typ": "JWT" }));
        let unsigned = format!("{header}.{payload}.");

        assert_matches!(
            codec.decode_access(&unsigned),
            Err(TokenError::UnsupportedAlgorithm(alg)) if alg == "none"
        );
    }

    #[test]
    fn test_other_hmac_variant_is_rejected() {
        let (codec, clock) = codec_with_clock();
        let mut config = test_config();
        config.algorithm = HmacAlgorithm::HS512;
        let hs512 = TokenCodec::new(&config, clock);

        let token = hs512.issue_access(&subject()).unwrap();
        assert_matches!(
            codec.decode_access(&token),
            Err(TokenError::UnsupportedAlgorithm(alg)) if alg == "HS512"
        );
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let (codec, clock) = codec_with_clock();
        let mut config = test_config();
        config.audience = "someone-else".to_string();
        let foreign = TokenCodec::new(&config, clock);

        let token = foreign.issue_access(&subject()).unwrap();
        assert_matches!(
            codec.decode_access(&token),
            Err(TokenError::ClaimMismatch("aud"))
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (codec, _) = codec_with_clock();
        assert_matches!(codec.decode_access("not-a-token"), Err(TokenError::Malformed));
        assert_matches!(codec.decode_access("a.b.c.d"), Err(TokenError::Malformed));
        assert_matches!(codec.decode_access("%%%.e30.sig"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("hs384".parse::<HmacAlgorithm>().unwrap(), HmacAlgorithm::HS384);
        assert_matches!(
            "RS256".parse::<HmacAlgorithm>(),
            Err(TokenError::UnsupportedAlgorithm(_))
        );
    }

    #[test]
    fn test_refresh_digest_is_stable_hex() {
        let digest = digest_refresh_token("some.refresh.token");
        assert_eq!(digest, digest_refresh_token("some.refresh.token"));
        assert_eq!(digest.len(), 64);
        assert_ne!(digest, digest_refresh_token("other.refresh.token"));
    }
}

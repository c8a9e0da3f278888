use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Arbitrary token payload. `exp` is managed by [`TokenService`].
pub type Claims = serde_json::Map<String, Value>;

/// Claim carrying the absolute expiry, in seconds since the Unix epoch.
pub const EXPIRY_CLAIM: &str = "exp";

/// Signing settings, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret_key: String,
    pub algorithm: String,
    pub default_expiry: Duration,
}

impl TokenSettings {
    pub const DEFAULT_EXPIRY_MINUTES: i64 = 15;

    pub fn new(secret_key: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: algorithm.into(),
            default_expiry: Duration::minutes(Self::DEFAULT_EXPIRY_MINUTES),
        }
    }

    pub fn with_default_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = expiry;
        self
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("default_expiry", &self.default_expiry)
            .finish()
    }
}

/// Token settings that must stop the process from starting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("token secret key must not be empty")]
    MissingSecretKey,
    #[error("token signing algorithm must not be empty")]
    MissingAlgorithm,
    #[error("unsupported token signing algorithm `{0}` (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("token expiry {0} is out of range")]
    ExpiryOutOfRange(Duration),
}

/// A token failed verification. The cause is not reported.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Signs and verifies stateless, time-limited bearer tokens (JWT).
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_expiry: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("default_expiry", &self.default_expiry)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(settings: TokenSettings) -> Result<Self, ConfigurationError> {
        if settings.secret_key.is_empty() {
            return Err(ConfigurationError::MissingSecretKey);
        }

        let name = settings.algorithm.trim();
        if name.is_empty() {
            return Err(ConfigurationError::MissingAlgorithm);
        }

        // Only the HMAC family can be driven by a shared secret.
        let algorithm = match Algorithm::from_str(name) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
            _ => return Err(ConfigurationError::UnsupportedAlgorithm(name.to_string())),
        };

        let secret = settings.secret_key.as_bytes();
        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_expiry: settings.default_expiry,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn default_expiry(&self) -> Duration {
        self.default_expiry
    }

    /// Sign a copy of `claims` with `exp` set to now + `expiry` (or the
    /// configured default). Any caller-provided `exp` is overwritten.
    pub fn issue(
        &self,
        claims: &Claims,
        expiry: Option<Duration>,
    ) -> Result<String, TokenError> {
        let expiry = expiry.unwrap_or(self.default_expiry);
        let expires_at = Utc::now()
            .checked_add_signed(expiry)
            .ok_or(TokenError::ExpiryOutOfRange(expiry))?;

        let mut to_encode = claims.clone();
        to_encode.insert(EXPIRY_CLAIM.to_string(), Value::from(expires_at.timestamp()));

        let token = encode(&Header::new(self.algorithm), &to_encode, &self.encoding_key)?;
        Ok(token)
    }

    /// Decode a token, checking its signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&[EXPIRY_CLAIM]);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => {
                debug!(error = %err, "token rejected");
                Err(InvalidToken)
            }
        }
    }

    /// Opaque value for [`UserRecord::refresh_token`](crate::domain::users::user::UserRecord).
    pub fn generate_refresh_token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

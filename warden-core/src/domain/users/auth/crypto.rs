use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
};
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

/// One-way password hashing for stored credentials.
///
/// Produces Argon2id PHC strings with a fresh random salt per call, so two
/// hashes of the same password differ while both verify. The PHC string
/// records its own algorithm, version, parameters and salt, which lets
/// [`CredentialHasher::verify`] check hashes made with other cost settings.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

impl From<password_hash::Error> for CryptoError {
    fn from(err: password_hash::Error) -> Self {
        CryptoError::PasswordHash(err.to_string())
    }
}

impl CredentialHasher {
    /// Recommended defaults target ~64 MiB memory and 3 iterations which is a
    /// solid baseline for servers without dedicated tuning.
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024; // 64 MiB
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;

    /// Build a hasher with default Argon2id parameters.
    pub fn new() -> Result<Self, CryptoError> {
        Self::from_costs(
            Self::DEFAULT_MEMORY_KIB,
            Self::DEFAULT_ITERATIONS,
            Self::DEFAULT_PARALLELISM,
        )
    }

    /// Build a hasher with caller-specified Argon2 parameters (useful for
    /// constrained environments).
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::default(), params),
        }
    }

    /// Cheapest parameters Argon2 accepts. Only for tests.
    pub fn insecure_for_tests() -> Result<Self, CryptoError> {
        Self::from_costs(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST)
    }

    fn from_costs(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, CryptoError> {
        let params = ParamsBuilder::new()
            .m_cost(m_cost)
            .t_cost(t_cost)
            .p_cost(p_cost)
            .output_len(32)
            .build()
            .map_err(|err| CryptoError::InvalidArgon2Params(err.to_string()))?;
        Ok(Self::with_params(params))
    }

    /// Hash a password with a random salt. The resulting PHC string is
    /// suitable for storage.
    pub fn hash(&self, password: &str) -> Result<String, CryptoError> {
        let material = Zeroizing::new(password.as_bytes().to_vec());

        // Salt comes from the workspace's rand crate rather than
        // password_hash's optional rand_core shim.
        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| CryptoError::PasswordHash(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)?;
        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(hash)
    }

    /// Verify a password against a stored hash. Malformed hashes verify as
    /// `false`.
    pub fn verify(&self, password: &str, password_hash: &str) -> bool {
        let parsed = match PasswordHash::new(password_hash) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(error = %err, "rejecting malformed password hash");
                return false;
            }
        };

        let material = Zeroizing::new(password.as_bytes().to_vec());
        self.argon2.verify_password(&material, &parsed).is_ok()
    }
}

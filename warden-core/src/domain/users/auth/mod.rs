//! Credential hashing and bearer-token primitives.

pub mod crypto;
pub mod token;

pub use crypto::{CredentialHasher, CryptoError};
pub use token::{
    Claims, ConfigurationError, InvalidToken, TokenError, TokenService,
    TokenSettings,
};

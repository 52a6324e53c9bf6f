//! JWT issuance and verification.
//!
//! Access and refresh tokens are signed with two separate Ed25519 key pairs
//! (EdDSA). A token signed with one pair never verifies under the other, so a
//! refresh token cannot be replayed as an access token or the reverse.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::spki::EncodePublicKey;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Not before (Unix timestamp), always equal to `iat`
    pub nbf: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token lifetime in seconds
    pub duration: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token signature does not match the verification key")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token could not be decoded")]
    Malformed,
    #[error("failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    #[error("system clock is before the Unix epoch")]
    Clock,
    #[error("token lifetime is out of range")]
    Lifetime,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("key is not valid UTF-8 PEM")]
    Utf8,
    #[error("invalid Ed25519 PEM key: {0}")]
    Pem(jsonwebtoken::errors::Error),
    #[error("failed to encode generated key: {0}")]
    Generate(String),
    #[error("private and public key do not belong to the same pair")]
    Mismatch,
    #[error("access and refresh tokens must use different key pairs")]
    SharedKeys,
}

/// PEM-encoded Ed25519 key pair (PKCS#8 private key, SPKI public key).
#[derive(Clone)]
pub struct PemKeyPair {
    pub private_pem: String,
    pub public_pem: String,
}

impl PemKeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::rng(), &mut seed);
        let signing_key = SigningKey::from_bytes(&seed);

        let private_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generate(e.to_string()))?;
        let public_pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generate(e.to_string()))?;

        Ok(Self {
            private_pem: private_pem.as_str().to_owned(),
            public_pem,
        })
    }

    /// Decode a pair stored as base64-encoded PEM (the environment variable format).
    pub fn from_base64(private_b64: &str, public_b64: &str) -> Result<Self, KeyError> {
        let decode = |value: &str| -> Result<String, KeyError> {
            let bytes = STANDARD.decode(value.trim())?;
            String::from_utf8(bytes).map_err(|_| KeyError::Utf8)
        };
        Ok(Self {
            private_pem: decode(private_b64)?,
            public_pem: decode(public_b64)?,
        })
    }

    /// Encode as base64 PEM, returns (private, public).
    pub fn to_base64(&self) -> (String, String) {
        (
            STANDARD.encode(self.private_pem.as_bytes()),
            STANDARD.encode(self.public_pem.as_bytes()),
        )
    }
}

/// Signing and verification halves of one key pair.
#[derive(Clone)]
pub struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    /// Parse a PEM pair and check that the public key verifies what the private key signs.
    pub fn from_pem(pem: &PemKeyPair) -> Result<Self, KeyError> {
        let encoding =
            EncodingKey::from_ed_pem(pem.private_pem.as_bytes()).map_err(KeyError::Pem)?;
        let decoding =
            DecodingKey::from_ed_pem(pem.public_pem.as_bytes()).map_err(KeyError::Pem)?;
        let pair = Self { encoding, decoding };

        if !pair.verifies(&pair.probe()?) {
            return Err(KeyError::Mismatch);
        }
        Ok(pair)
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    fn probe(&self) -> Result<String, KeyError> {
        issue("key-check", Duration::from_secs(60), &self.encoding)
            .map(|issued| issued.token)
            .map_err(|_| KeyError::Mismatch)
    }

    fn verifies(&self, token: &str) -> bool {
        verify(token, &self.decoding).is_ok()
    }
}

/// The access and refresh key pairs, loaded once at startup and shared read-only.
#[derive(Clone)]
pub struct KeyMaterial {
    pub access: KeyPair,
    pub refresh: KeyPair,
}

impl KeyMaterial {
    /// Build key material, rejecting configurations where both token kinds share a key.
    pub fn new(access: KeyPair, refresh: KeyPair) -> Result<Self, KeyError> {
        if refresh.verifies(&access.probe()?) {
            return Err(KeyError::SharedKeys);
        }
        Ok(Self { access, refresh })
    }

    pub fn from_pem(access: &PemKeyPair, refresh: &PemKeyPair) -> Result<Self, KeyError> {
        Self::new(KeyPair::from_pem(access)?, KeyPair::from_pem(refresh)?)
    }

    /// Generate throwaway key material (development and tests).
    pub fn generate() -> Result<Self, KeyError> {
        Self::from_pem(&PemKeyPair::generate()?, &PemKeyPair::generate()?)
    }
}

fn now_secs() -> Result<u64, TokenError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::Clock)?
        .as_secs())
}

/// Sign a token for `subject` valid for `ttl` from now.
pub fn issue(subject: &str, ttl: Duration, key: &EncodingKey) -> Result<IssuedToken, TokenError> {
    issue_at(subject, ttl, key, now_secs()?)
}

/// Sign a token as if issued at `now` (Unix seconds). Identical inputs give identical tokens.
pub fn issue_at(
    subject: &str,
    ttl: Duration,
    key: &EncodingKey,
    now: u64,
) -> Result<IssuedToken, TokenError> {
    let duration = ttl.as_secs();
    let exp = now.checked_add(duration).ok_or(TokenError::Lifetime)?;
    let claims = TokenClaims {
        sub: subject.to_string(),
        iat: now,
        nbf: now,
        exp,
    };

    let token = jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), &claims, key)
        .map_err(TokenError::Encoding)?;

    Ok(IssuedToken {
        token,
        expires_at: claims.exp,
        duration,
    })
}

/// Verify signature and expiry, returning the embedded claims.
pub fn verify(token: &str, key: &DecodingKey) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.leeway = 0;
    validation.validate_nbf = true;

    let token_data = jsonwebtoken::decode::<TokenClaims>(token, key, &validation)?;
    Ok(token_data.claims)
}

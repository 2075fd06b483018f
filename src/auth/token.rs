//! JWT issuance, verification and refresh.
//!
//! Tokens are RS256-signed and self-contained: issuer, audience, expiry and
//! issued-at are stamped by the service, everything else is a caller-supplied
//! payload map. There is no revocation list; a token dies only by expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::AuthConfig;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    /// Caller-supplied payload (e.g. `userId`).
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Claims {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Signs, parses and refreshes bearer tokens. Key material is parsed once at
/// construction and immutable afterwards. A process configured with only the
/// public key can verify but not sign.
pub struct TokenService {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn from_config(cfg: &AuthConfig) -> Result<Self, AppError> {
        Self::new(
            if cfg.private_key.is_empty() {
                None
            } else {
                Some(cfg.private_key.as_str())
            },
            &cfg.public_key,
            &cfg.issuer,
            &cfg.audience,
            cfg.token_ttl_minutes,
            cfg.refresh_ttl_minutes,
        )
    }

    pub fn new(
        private_key_pem: Option<&str>,
        public_key_pem: &str,
        issuer: &str,
        audience: &str,
        token_ttl_minutes: i64,
        refresh_ttl_minutes: i64,
    ) -> Result<Self, AppError> {
        let encoding_key = private_key_pem
            .map(|pem| {
                EncodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| AuthError::Signing(format!("invalid private key: {}", e)))
            })
            .transpose()?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| AuthError::Signing(format!("invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            issuer: issuer.to_string(),
            audience: audience.to_string(),
            token_ttl: Duration::minutes(token_ttl_minutes),
            refresh_ttl: Duration::minutes(refresh_ttl_minutes),
        })
    }

    /// Merges the caller payload with issuer, audience, `iat = now` and
    /// `exp = now + TTL`, then signs with the private key.
    pub fn generate_token(&self, data: Map<String, Value>) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
            data,
        };

        self.sign(&claims)
    }

    /// Verifies signature, algorithm family, issuer, audience and expiry.
    /// Expiry is strict: zero leeway, a token is valid only while
    /// `now < exp`.
    pub fn parse_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = 0;

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    tracing::debug!("token rejected: expired");
                    AuthError::TokenExpired
                }
                kind => {
                    tracing::debug!("token rejected: {:?}", kind);
                    AuthError::InvalidToken
                }
            }
        })?;

        Ok(decoded.claims)
    }

    /// Re-issues a still-valid token with `exp = now + refresh TTL`. Every
    /// other claim, including `iat`, is carried over. An expired or otherwise
    /// invalid token cannot be refreshed.
    pub fn refresh_token(&self, token: &str) -> Result<String, AppError> {
        let mut claims = self.parse_token(token)?;
        claims.exp = (Utc::now() + self.refresh_ttl).timestamp();
        self.sign(&claims)
    }

    /// Thin wrapper over [`parse_token`](Self::parse_token) that discards the
    /// claims.
    pub fn validate_token(&self, token: &str) -> Result<(), AppError> {
        self.parse_token(token).map(|_| ())
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        let key = self.encoding_key.as_ref().ok_or_else(|| {
            AuthError::Signing("private key not configured, cannot sign".into())
        })?;

        encode(&Header::new(Algorithm::RS256), claims, key)
            .map_err(|e| AuthError::Signing(e.to_string()).into())
    }
}

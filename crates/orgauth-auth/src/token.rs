//! Access and refresh token lifecycle.
//!
//! Refresh tokens are opaque random strings persisted in the token store
//! under a keyed hash, mapped to the owner's email with no expiry. Access
//! tokens are HS256 JWTs validated purely by signature and expiry; they
//! are never stored, so revoking a refresh token leaves access tokens
//! already minted from it valid until they expire.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use orgauth_core::models::user::User;
use orgauth_core::repository::TokenStore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Key prefix for refresh-token mappings in the token store.
const REFRESH_KEY_PREFIX: &str = "refresh:";

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Owner of the refresh token this access token was minted from.
    pub email: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// Sign an HS256 access token for `email`, valid from `now` for the
/// configured lifetime.
pub fn sign_access_token(
    email: &str,
    config: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let iat = now.timestamp();
    let exp = i64::try_from(config.access_token_lifetime_secs)
        .ok()
        .and_then(|lifetime| iat.checked_add(lifetime))
        .ok_or_else(|| {
            AuthError::Crypto(format!(
                "access token lifetime {}s overflows the expiry claim",
                config.access_token_lifetime_secs
            ))
        })?;
    let claims = AccessTokenClaims {
        email: email.to_string(),
        iss: config.jwt_issuer.clone(),
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.access_token_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify an access token as of `now`.
///
/// Signature, algorithm, issuer and structure are checked by
/// `jsonwebtoken`; expiry is checked here with zero leeway so that a
/// token is rejected from the exact second `exp` is reached.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<AccessTokenClaims, AuthError> {
    let key = DecodingKey::from_secret(config.access_token_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    let claims = jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Access token rejected");
            AuthError::InvalidToken
        })?;

    if now.timestamp() >= claims.exp {
        debug!(email = %claims.email, exp = claims.exp, "Access token expired");
        return Err(AuthError::InvalidToken);
    }

    Ok(claims)
}

/// Generate a cryptographically random opaque refresh token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_refresh_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Token-store key for a raw refresh token: HMAC-SHA256 under the
/// refresh secret, hex-encoded. The raw token never reaches the store.
pub fn refresh_token_key(raw: &str, secret: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("HMAC key: {e}")))?;
    mac.update(raw.as_bytes());
    Ok(format!(
        "{REFRESH_KEY_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Issues, validates and revokes tokens.
///
/// A refresh token is either active (mapped in the store) or revoked
/// (absent). Nothing distinguishes a revoked token from one that was
/// never issued.
pub struct TokenService<T: TokenStore> {
    store: T,
    config: AuthConfig,
}

impl<T: TokenStore> TokenService<T> {
    pub fn new(store: T, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Mint a refresh token for `user` and persist it.
    pub async fn issue_refresh_token(&self, user: &User) -> AuthResult<String> {
        let raw = generate_refresh_token();
        let key = refresh_token_key(&raw, &self.config.refresh_token_secret)?;

        bounded(
            self.config.store_timeout,
            self.store.set_mapping(&key, &user.email),
        )
        .await
        .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        info!(email = %user.email, "Refresh token issued");
        Ok(raw)
    }

    /// Exchange a refresh token for a fresh access token.
    pub async fn issue_access_token(&self, refresh_token: &str) -> AuthResult<String> {
        self.issue_access_token_at(refresh_token, Utc::now()).await
    }

    /// As [`issue_access_token`](Self::issue_access_token), with an
    /// explicit issue time.
    pub async fn issue_access_token_at(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        let email = self
            .owner_of(refresh_token)
            .await?
            .ok_or(AuthError::UnknownRefreshToken)?;

        sign_access_token(&email, &self.config, now)
    }

    /// Resolve the email asserted by an access token. Never consults the
    /// token store.
    pub fn validate_access_token(&self, token: &str) -> AuthResult<String> {
        self.validate_access_token_at(token, Utc::now())
    }

    pub fn validate_access_token_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<String> {
        decode_access_token(token, &self.config, now).map(|claims| claims.email)
    }

    /// Delete the mapping for `refresh_token` if it belongs to
    /// `requester_email`.
    pub async fn revoke_refresh_token(
        &self,
        refresh_token: &str,
        requester_email: &str,
    ) -> AuthResult<()> {
        let key = refresh_token_key(refresh_token, &self.config.refresh_token_secret)?;

        let owner = bounded(self.config.store_timeout, self.store.get_mapping(&key))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?
            .ok_or(AuthError::UnknownRefreshToken)?;

        if owner != requester_email {
            warn!(
                requester = %requester_email,
                "Refresh token revocation by non-owner rejected"
            );
            return Err(AuthError::NotOwner);
        }

        bounded(self.config.store_timeout, self.store.delete_mapping(&key))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        info!(email = %owner, "Refresh token revoked");
        Ok(())
    }

    async fn owner_of(&self, refresh_token: &str) -> AuthResult<Option<String>> {
        let key = refresh_token_key(refresh_token, &self.config.refresh_token_secret)?;
        bounded(self.config.store_timeout, self.store.get_mapping(&key))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }
}

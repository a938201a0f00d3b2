// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT access/refresh token issuance, refresh rotation and blacklisting.
//!
//! Access tokens are short-lived and authorize API calls. Refresh tokens are
//! long-lived and only exchange for new access tokens. With rotation enabled
//! every refresh also hands out a new refresh token and blacklists the old
//! one, so a stolen refresh token works at most once.

use crate::cache::{Cache, CacheError};
use crate::models::User;
use crate::settings::JwtSettings;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BLACKLIST_PREFIX: &str = "token_blacklist:";

/// Kind of token, carried in the `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token id, used for blacklisting
    pub jti: String,
    pub user_id: i64,
    pub email: String,
    pub is_staff: bool,
}

/// Subject of a token pair.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: i64,
    pub email: String,
    pub is_staff: bool,
}

impl From<&User> for TokenSubject {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            is_staff: user.is_staff,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Result of a refresh. `refresh` is only set when rotation is enabled.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedTokens {
    pub access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token is invalid or expired")]
    Invalid,

    #[error("Token has wrong type")]
    WrongType,

    #[error("Token is blacklisted")]
    Blacklisted,

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<TokenError> for crate::error::AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::WrongType | TokenError::Blacklisted => {
                crate::error::AppError::InvalidToken
            }
            TokenError::Signing(e) => crate::error::AppError::Internal(e.into()),
            TokenError::Cache(e) => e.into(),
        }
    }
}

/// Issues and verifies HS256 tokens signed with the application secret key.
#[derive(Clone)]
pub struct TokenService {
    settings: JwtSettings,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cache: Cache,
}

impl TokenService {
    pub fn new(settings: JwtSettings, secret_key: &str, cache: Cache) -> Self {
        Self {
            settings,
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            cache,
        }
    }

    pub fn settings(&self) -> &JwtSettings {
        &self.settings
    }

    /// Issue a fresh access/refresh pair.
    pub fn issue_pair(&self, subject: &TokenSubject) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(subject, TokenType::Access)?,
            refresh: self.issue(subject, TokenType::Refresh)?,
        })
    }

    fn issue(&self, subject: &TokenSubject, token_type: TokenType) -> Result<String, TokenError> {
        let lifetime = match token_type {
            TokenType::Access => self.settings.access_token_lifetime,
            TokenType::Refresh => self.settings.refresh_token_lifetime,
        };
        let now = Utc::now().timestamp();

        let claims = Claims {
            token_type,
            iat: now,
            exp: now + lifetime.num_seconds(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
            user_id: subject.user_id,
            email: subject.email.clone(),
            is_staff: subject.is_staff,
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Decode and validate a token of the expected type.
    ///
    /// Refresh tokens are also checked against the blacklist.
    pub async fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?
            .claims;

        if claims.token_type != expected {
            return Err(TokenError::WrongType);
        }

        if expected == TokenType::Refresh && self.is_blacklisted(&claims.jti).await? {
            return Err(TokenError::Blacklisted);
        }

        Ok(claims)
    }

    /// Validate a token of either type.
    pub async fn verify_any(&self, token: &str) -> Result<Claims, TokenError> {
        match self.verify(token, TokenType::Access).await {
            Err(TokenError::WrongType) => self.verify(token, TokenType::Refresh).await,
            other => other,
        }
    }

    /// Exchange verified refresh claims for a new access token (and, with
    /// rotation, a new refresh token) minted for `subject`.
    ///
    /// The caller reloads `subject` from storage so the new tokens carry the
    /// account's current flags. With blacklist-after-rotation the old `jti`
    /// is claimed before anything is issued, so of several concurrent
    /// refreshes with one token only the first succeeds.
    pub async fn refresh(
        &self,
        claims: &Claims,
        subject: &TokenSubject,
    ) -> Result<RefreshedTokens, TokenError> {
        if claims.token_type != TokenType::Refresh {
            return Err(TokenError::WrongType);
        }

        let rotate = self.settings.rotate_refresh_tokens;
        if rotate && self.settings.blacklist_after_rotation && !self.claim_blacklist(claims).await? {
            return Err(TokenError::Blacklisted);
        }

        let access = self.issue(subject, TokenType::Access)?;
        if !rotate {
            return Ok(RefreshedTokens {
                access,
                refresh: None,
            });
        }

        tracing::debug!(user_id = subject.user_id, "Rotated refresh token");

        Ok(RefreshedTokens {
            access,
            refresh: Some(self.issue(subject, TokenType::Refresh)?),
        })
    }

    /// Blacklist a refresh token so it can no longer be used.
    pub async fn blacklist(&self, refresh_token: &str) -> Result<(), TokenError> {
        let claims = self.verify(refresh_token, TokenType::Refresh).await?;
        self.blacklist_claims(&claims).await?;
        tracing::info!(user_id = claims.user_id, "Refresh token blacklisted");
        Ok(())
    }

    /// Entries only need to outlive the token itself.
    fn blacklist_ttl(claims: &Claims) -> Duration {
        Duration::from_secs((claims.exp - Utc::now().timestamp()).max(1) as u64)
    }

    async fn blacklist_claims(&self, claims: &Claims) -> Result<(), TokenError> {
        self.cache
            .set(&blacklist_key(&claims.jti), "1", Some(Self::blacklist_ttl(claims)))
            .await?;
        Ok(())
    }

    /// Blacklist the token unless it already is. Returns `false` when some
    /// other caller got there first.
    async fn claim_blacklist(&self, claims: &Claims) -> Result<bool, TokenError> {
        Ok(self
            .cache
            .set_if_absent(&blacklist_key(&claims.jti), "1", Some(Self::blacklist_ttl(claims)))
            .await?)
    }

    async fn is_blacklisted(&self, jti: &str) -> Result<bool, TokenError> {
        Ok(self.cache.exists(&blacklist_key(jti)).await?)
    }
}

fn blacklist_key(jti: &str) -> String {
    format!("{}{}", BLACKLIST_PREFIX, jti)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn service() -> TokenService {
        let settings = Settings::test_default();
        TokenService::new(settings.jwt, &settings.secret_key, Cache::local())
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: 42,
            email: "ada@example.com".to_string(),
            is_staff: false,
        }
    }

    #[tokio::test]
    async fn test_pair_roundtrip() {
        let tokens = service();
        let pair = tokens.issue_pair(&subject()).unwrap();

        let access = tokens.verify(&pair.access, TokenType::Access).await.unwrap();
        assert_eq!(access.user_id, 42);
        assert_eq!(access.exp - access.iat, 60 * 60);

        let refresh = tokens.verify(&pair.refresh, TokenType::Refresh).await.unwrap();
        assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 60 * 60);
        assert_ne!(access.jti, refresh.jti);
    }

    async fn refresh(tokens: &TokenService, refresh: &str) -> Result<RefreshedTokens, TokenError> {
        let claims = tokens.verify(refresh, TokenType::Refresh).await?;
        tokens.refresh(&claims, &subject()).await
    }

    #[tokio::test]
    async fn test_type_confusion_rejected() {
        let tokens = service();
        let pair = tokens.issue_pair(&subject()).unwrap();

        assert!(matches!(
            tokens.verify(&pair.refresh, TokenType::Access).await,
            Err(TokenError::WrongType)
        ));
        assert!(matches!(
            refresh(&tokens, &pair.access).await,
            Err(TokenError::WrongType)
        ));

        let access = tokens.verify(&pair.access, TokenType::Access).await.unwrap();
        assert!(matches!(
            tokens.refresh(&access, &subject()).await,
            Err(TokenError::WrongType)
        ));
    }

    #[tokio::test]
    async fn test_rotation_blacklists_old_refresh() {
        let tokens = service();
        let pair = tokens.issue_pair(&subject()).unwrap();

        let refreshed = refresh(&tokens, &pair.refresh).await.unwrap();
        let rotated = refreshed.refresh.expect("rotation is enabled by default");

        assert!(matches!(
            refresh(&tokens, &pair.refresh).await,
            Err(TokenError::Blacklisted)
        ));
        assert!(refresh(&tokens, &rotated).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_one_winner() {
        let tokens = service();
        let pair = tokens.issue_pair(&subject()).unwrap();

        // Both callers pass verification before either rotates.
        let first = tokens.verify(&pair.refresh, TokenType::Refresh).await.unwrap();
        let second = tokens.verify(&pair.refresh, TokenType::Refresh).await.unwrap();

        let subject_a = subject();
        let subject_b = subject();
        let (a, b) = tokio::join!(
            tokens.refresh(&first, &subject_a),
            tokens.refresh(&second, &subject_b)
        );
        let outcomes = [a.is_ok(), b.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(TokenError::Blacklisted)));
    }

    #[tokio::test]
    async fn test_refresh_mints_for_given_subject() {
        let tokens = service();
        let pair = tokens.issue_pair(&subject()).unwrap();
        let claims = tokens.verify(&pair.refresh, TokenType::Refresh).await.unwrap();

        let promoted = TokenSubject {
            is_staff: true,
            ..subject()
        };
        let refreshed = tokens.refresh(&claims, &promoted).await.unwrap();
        let access = tokens.verify(&refreshed.access, TokenType::Access).await.unwrap();
        assert!(access.is_staff);
    }

    #[tokio::test]
    async fn test_no_rotation() {
        let settings = Settings::test_default();
        let mut jwt = settings.jwt.clone();
        jwt.rotate_refresh_tokens = false;
        let tokens = TokenService::new(jwt, &settings.secret_key, Cache::local());

        let pair = tokens.issue_pair(&subject()).unwrap();
        let refreshed = refresh(&tokens, &pair.refresh).await.unwrap();
        assert!(refreshed.refresh.is_none());
        // Without rotation the same refresh token keeps working.
        assert!(refresh(&tokens, &pair.refresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_explicit_blacklist() {
        let tokens = service();
        let pair = tokens.issue_pair(&subject()).unwrap();

        tokens.blacklist(&pair.refresh).await.unwrap();
        assert!(matches!(
            tokens.verify(&pair.refresh, TokenType::Refresh).await,
            Err(TokenError::Blacklisted)
        ));
        // Access tokens are unaffected until they expire.
        assert!(tokens.verify(&pair.access, TokenType::Access).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_any_accepts_both_types() {
        let tokens = service();
        let pair = tokens.issue_pair(&subject()).unwrap();

        let access = tokens.verify_any(&pair.access).await.unwrap();
        assert_eq!(access.token_type, TokenType::Access);
        let refresh = tokens.verify_any(&pair.refresh).await.unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);

        tokens.blacklist(&pair.refresh).await.unwrap();
        assert!(matches!(
            tokens.verify_any(&pair.refresh).await,
            Err(TokenError::Blacklisted)
        ));
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let tokens = service();
        let other = TokenService::new(
            Settings::test_default().jwt,
            "a-completely-different-secret-key",
            Cache::local(),
        );
        let pair = other.issue_pair(&subject()).unwrap();

        assert!(matches!(
            tokens.verify(&pair.access, TokenType::Access).await,
            Err(TokenError::Invalid)
        ));
    }
}

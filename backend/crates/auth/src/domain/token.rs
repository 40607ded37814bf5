//! Token Minter
//!
//! Mints and parses HS256 JWTs for three purposes. Claims are a closed,
//! internally tagged enum keyed by the `type` claim, so a parsed token is
//! always one concrete variant with typed fields.
//!
//! Key selection follows the *expected* kind: access and verify tokens are
//! signed with the access secret, refresh tokens with the refresh secret. A
//! refresh token presented as an access token (or the reverse) fails the
//! signature check before any claim is looked at.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use platform::clock::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

const EXPECTED_ALG: &str = "HS256";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TokenKind {
    #[display("access")]
    Access,
    #[display("refresh")]
    Refresh,
    #[display("verify")]
    Verify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature verification failed")]
    BadSignature,
    #[error("unexpected signing algorithm")]
    WrongAlgorithm,
    #[error("token expired")]
    Expired,
    #[error("expected a {expected} token, got {found}")]
    WrongType { expected: TokenKind, found: TokenKind },
}

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub role: UserRole,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub user_id: UserId,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyClaims {
    pub email: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
    Verify(VerifyClaims),
}

impl Claims {
    pub fn kind(&self) -> TokenKind {
        match self {
            Claims::Access(_) => TokenKind::Access,
            Claims::Refresh(_) => TokenKind::Refresh,
            Claims::Verify(_) => TokenKind::Verify,
        }
    }

    pub fn jti(&self) -> &str {
        match self {
            Claims::Access(c) => &c.jti,
            Claims::Refresh(c) => &c.jti,
            Claims::Verify(c) => &c.jti,
        }
    }

    pub fn iat(&self) -> i64 {
        match self {
            Claims::Access(c) => c.iat,
            Claims::Refresh(c) => c.iat,
            Claims::Verify(c) => c.iat,
        }
    }

    pub fn exp(&self) -> i64 {
        match self {
            Claims::Access(c) => c.exp,
            Claims::Refresh(c) => c.exp,
            Claims::Verify(c) => c.exp,
        }
    }
}

/// What a token is about. The minter adds `jti`, `iat` and `exp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSubject {
    Access { user_id: UserId, role: UserRole },
    Refresh { user_id: UserId },
    Verify { email: String },
}

impl TokenSubject {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenSubject::Access { .. } => TokenKind::Access,
            TokenSubject::Refresh { .. } => TokenKind::Refresh,
            TokenSubject::Verify { .. } => TokenKind::Verify,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    pub claims: Claims,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ============================================================================
// Minter
// ============================================================================

pub struct TokenMinter {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenMinter {
    pub fn new(access_secret: &[u8], refresh_secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        // Expiry is checked against the injected clock in `parse`, strictly.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            validation,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Mint a token valid for `ttl` from now, with a fresh `jti`.
    pub fn mint(&self, subject: TokenSubject, ttl: Duration) -> AuthResult<MintedToken> {
        let now = self.clock.now();
        self.mint_until(subject, now + ttl)
    }

    /// Mint a token expiring at `expires_at`, with a fresh `jti`.
    pub fn mint_until(
        &self,
        subject: TokenSubject,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<MintedToken> {
        let issued_at = self.clock.now();
        let jti = Uuid::new_v4().to_string();
        let iat = issued_at.timestamp();
        let exp = expires_at.timestamp();

        let kind = subject.kind();
        let claims = match subject {
            TokenSubject::Access { user_id, role } => Claims::Access(AccessClaims {
                user_id,
                role,
                jti,
                iat,
                exp,
            }),
            TokenSubject::Refresh { user_id } => Claims::Refresh(RefreshClaims {
                user_id,
                jti,
                iat,
                exp,
            }),
            TokenSubject::Verify { email } => Claims::Verify(VerifyClaims {
                email,
                jti,
                iat,
                exp,
            }),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, self.encoding_key(kind))
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?;

        Ok(MintedToken {
            token,
            claims,
            issued_at,
            expires_at,
        })
    }

    /// Verify `token` as a token of kind `expected`.
    ///
    /// Checks run in order: structure, header algorithm, signature (with the
    /// key for `expected`), `type` claim, then `now >= exp` with no leeway.
    pub fn parse(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.parse_ignoring_expiry(token, expected)?;
        if self.clock.now().timestamp() >= claims.exp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Like [`parse`](Self::parse) but accepts tokens past `exp`. Signature
    /// and `type` are still enforced. Logout uses this so a stale cookie can
    /// still be revoked.
    pub fn parse_ignoring_expiry(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> Result<Claims, TokenError> {
        let header_segment = match token.split('.').collect::<Vec<_>>().as_slice() {
            [h, p, s] if !h.is_empty() && !p.is_empty() && !s.is_empty() => *h,
            _ => return Err(TokenError::Malformed),
        };
        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_segment)
            .map_err(|_| TokenError::Malformed)?;
        let header: serde_json::Value =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
        match header.get("alg").and_then(|alg| alg.as_str()) {
            Some(EXPECTED_ALG) => {}
            Some(_) => return Err(TokenError::WrongAlgorithm),
            None => return Err(TokenError::Malformed),
        }

        let data = decode::<Claims>(token, self.decoding_key(expected), &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature => TokenError::BadSignature,
                JwtErrorKind::InvalidAlgorithm | JwtErrorKind::InvalidAlgorithmName => {
                    TokenError::WrongAlgorithm
                }
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;
        let claims = data.claims;

        let found = claims.kind();
        if found != expected {
            return Err(TokenError::WrongType { expected, found });
        }

        Ok(claims)
    }

    pub fn parse_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        match self.parse(token, TokenKind::Access)? {
            Claims::Access(claims) => Ok(claims),
            other => Err(TokenError::WrongType {
                expected: TokenKind::Access,
                found: other.kind(),
            }),
        }
    }

    pub fn parse_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        match self.parse(token, TokenKind::Refresh)? {
            Claims::Refresh(claims) => Ok(claims),
            other => Err(TokenError::WrongType {
                expected: TokenKind::Refresh,
                found: other.kind(),
            }),
        }
    }

    pub fn parse_verify(&self, token: &str) -> Result<VerifyClaims, TokenError> {
        match self.parse(token, TokenKind::Verify)? {
            Claims::Verify(claims) => Ok(claims),
            other => Err(TokenError::WrongType {
                expected: TokenKind::Verify,
                found: other.kind(),
            }),
        }
    }

    fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access | TokenKind::Verify => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access | TokenKind::Verify => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }
}

impl std::fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMinter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::clock::ManualClock;

    const ACCESS: &[u8] = b"access-secret-for-tests-0123456789";
    const REFRESH: &[u8] = b"refresh-secret-for-tests-987654321";

    fn minter() -> (TokenMinter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        (TokenMinter::new(ACCESS, REFRESH, clock.clone()), clock)
    }

    fn access_subject() -> TokenSubject {
        TokenSubject::Access {
            user_id: UserId::from_i64(42),
            role: UserRole::Admin,
        }
    }

    #[test]
    fn test_mint_and_parse_each_kind() {
        let (minter, _) = minter();
        let subjects = [
            access_subject(),
            TokenSubject::Refresh {
                user_id: UserId::from_i64(42),
            },
            TokenSubject::Verify {
                email: "a@x.test".into(),
            },
        ];

        for subject in subjects {
            let kind = subject.kind();
            let minted = minter.mint(subject, Duration::minutes(15)).unwrap();
            let parsed = minter.parse(&minted.token, kind).unwrap();
            assert_eq!(parsed, minted.claims);

            let now = minter.now().timestamp();
            assert!(parsed.iat() <= now && now < parsed.exp());
        }
    }

    #[test]
    fn test_wire_claims_carry_type() {
        let (minter, _) = minter();
        let minted = minter.mint(access_subject(), Duration::minutes(15)).unwrap();
        let payload = minted.token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        assert_eq!(json["type"], "access");
        assert_eq!(json["user_id"], 42);
        assert_eq!(json["role"], "admin");
        assert!(json["jti"].is_string());
    }

    #[test]
    fn test_fresh_jti_per_mint() {
        let (minter, _) = minter();
        let subject = TokenSubject::Refresh {
            user_id: UserId::from_i64(1),
        };
        let a = minter.mint(subject.clone(), Duration::days(7)).unwrap();
        let b = minter.mint(subject, Duration::days(7)).unwrap();
        assert_ne!(a.claims.jti(), b.claims.jti());
    }

    #[test]
    fn test_wrong_type_with_shared_key() {
        let (minter, _) = minter();
        let verify = minter
            .mint(
                TokenSubject::Verify {
                    email: "a@x.test".into(),
                },
                Duration::hours(24),
            )
            .unwrap();
        assert_eq!(
            minter.parse(&verify.token, TokenKind::Access),
            Err(TokenError::WrongType {
                expected: TokenKind::Access,
                found: TokenKind::Verify
            })
        );
    }

    #[test]
    fn test_cross_kind_rejected_by_key() {
        let (minter, _) = minter();
        let access = minter.mint(access_subject(), Duration::minutes(15)).unwrap();
        assert_eq!(
            minter.parse(&access.token, TokenKind::Refresh),
            Err(TokenError::BadSignature)
        );

        let refresh = minter
            .mint(
                TokenSubject::Refresh {
                    user_id: UserId::from_i64(42),
                },
                Duration::days(7),
            )
            .unwrap();
        assert_eq!(
            minter.parse(&refresh.token, TokenKind::Access),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_expiry_is_strict() {
        let (minter, clock) = minter();
        let minted = minter.mint(access_subject(), Duration::minutes(15)).unwrap();

        clock.advance(Duration::minutes(15) - Duration::seconds(1));
        assert!(minter.parse(&minted.token, TokenKind::Access).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(
            minter.parse(&minted.token, TokenKind::Access),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_parse_ignoring_expiry() {
        let (minter, clock) = minter();
        let minted = minter
            .mint(
                TokenSubject::Refresh {
                    user_id: UserId::from_i64(3),
                },
                Duration::days(1),
            )
            .unwrap();
        clock.advance(Duration::days(2));

        assert_eq!(
            minter.parse(&minted.token, TokenKind::Refresh),
            Err(TokenError::Expired)
        );
        let claims = minter
            .parse_ignoring_expiry(&minted.token, TokenKind::Refresh)
            .unwrap();
        assert_eq!(claims.jti(), minted.claims.jti());
        assert_eq!(
            minter.parse_ignoring_expiry(&minted.token, TokenKind::Access),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_tampered_token() {
        let (minter, _) = minter();
        let minted = minter.mint(access_subject(), Duration::minutes(15)).unwrap();

        let mut bytes = minted.token.into_bytes();
        let i = bytes.len() - 10;
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(
            minter.parse(&tampered, TokenKind::Access),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_inputs() {
        let (minter, _) = minter();
        for input in ["", "abc", "a.b", "a..c", "a.b.c.d", "!!!.???.###"] {
            assert_eq!(
                minter.parse(input, TokenKind::Access),
                Err(TokenError::Malformed),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_wrong_algorithm() {
        let (minter, _) = minter();
        let claims = Claims::Access(AccessClaims {
            user_id: UserId::from_i64(1),
            role: UserRole::User,
            jti: "j".into(),
            iat: 1_700_000_000,
            exp: 1_800_000_000,
        });
        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(ACCESS),
        )
        .unwrap();
        assert_eq!(
            minter.parse(&hs512, TokenKind::Access),
            Err(TokenError::WrongAlgorithm)
        );

        // alg "none" with an empty-looking signature segment
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = hs512.split('.').nth(1).unwrap();
        let unsigned = format!("{header}.{payload}.x");
        assert_eq!(
            minter.parse(&unsigned, TokenKind::Access),
            Err(TokenError::WrongAlgorithm)
        );
    }
}

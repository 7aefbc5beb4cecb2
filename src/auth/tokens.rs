use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::Config;
use crate::errors::Result;
use crate::models::User;

/// Claims of the short-lived access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims of the refresh token. Only identifies the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// The two tokens handed out on every successful authentication
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl: Duration) -> Self {
        SigningKey {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }

    fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Ok(decode::<C>(token, &self.decoding, &validation)?.claims)
    }
}

/// Signs and verifies HS256 tokens. Access and refresh tokens use distinct secrets so one can
/// never stand in for the other.
pub struct TokenIssuer {
    access: SigningKey,
    refresh: SigningKey,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        TokenIssuer {
            access: SigningKey::new(&config.access_token_secret, config.access_token_expiry),
            refresh: SigningKey::new(&config.refresh_token_secret, config.refresh_token_expiry),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    pub fn issue(&self, user: &User) -> Result<TokenPair> {
        let now = Utc::now().timestamp();
        let access = AccessClaims {
            id: user.id,
            name: user.name.clone(),
            phone: user.phone.clone(),
            iat: now,
            exp: now + self.access.ttl.as_secs() as i64,
        };
        let refresh = RefreshClaims {
            id: user.id,
            iat: now,
            exp: now + self.refresh.ttl.as_secs() as i64,
        };

        Ok(TokenPair {
            access_token: self.access.sign(&access)?,
            refresh_token: self.refresh.sign(&refresh)?,
        })
    }

    /// Check signature and expiry of an access token
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        self.access.verify(token)
    }

    /// Check signature and expiry of a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        self.refresh.verify(token)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::Role;

    fn user() -> User {
        User {
            id: 7,
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: Role::Customer,
            created_at: Utc::now(),
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&Config::with_secrets("access-secret", "refresh-secret"))
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let pair = issuer.issue(&user()).unwrap();

        let access = issuer.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.id, 7);
        assert_eq!(access.phone, "9876543210");
        assert_eq!(access.exp - access.iat, 24 * 60 * 60);

        let refresh = issuer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.id, 7);
        assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue(&user()).unwrap();

        assert!(issuer.verify_access(&pair.refresh_token).is_err());
        assert!(issuer.verify_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            id: 7,
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = issuer.access.sign(&claims).unwrap();

        let err = issuer.verify_access(&token).unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_foreign_signature() {
        let other = TokenIssuer::new(&Config::with_secrets("other", "other-refresh"));
        let pair = other.issue(&user()).unwrap();
        assert!(issuer().verify_access(&pair.access_token).is_err());
        assert!(issuer().verify_access("not.a.token").is_err());
    }
}

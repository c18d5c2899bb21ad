use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ISSUER: &str = "ghosting-api";

/// JWT claims carried by access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
        }
    }

    pub fn create_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::minutes(self.access_token_minutes);

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Returns claims if the token is correctly signed, unexpired and ours.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", 60);
        let user_id = Uuid::new_v4();

        let token = service.create_token(user_id, "ada@example.com").unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_token_lifetime_follows_config() {
        let service = JwtService::new("test_secret_key", 30);
        let token = service.create_token(Uuid::new_v4(), "a@b.c").unwrap();
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::new("test_secret_key", 60);
        assert!(service.verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let issuer = JwtService::new("secret1", 60);
        let verifier = JwtService::new("secret2", 60);
        let token = issuer.create_token(Uuid::new_v4(), "a@b.c").unwrap();
        assert!(verifier.verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // beyond the default 60s leeway
        let service = JwtService::new("test_secret_key", -5);
        let token = service.create_token(Uuid::new_v4(), "a@b.c").unwrap();
        assert!(service.verify_token(&token).is_err());
    }
}

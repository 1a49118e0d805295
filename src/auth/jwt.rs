use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::models::{Claims, TokenType};

/// Who a token is issued to.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: u64,
    pub username: String,
    pub role: u8,
    pub tenant_id: u64,
    pub employee_id: Option<u64>,
}

impl From<&Claims> for TokenSubject {
    fn from(claims: &Claims) -> Self {
        TokenSubject {
            user_id: claims.user_id,
            username: claims.sub.clone(),
            role: claims.role,
            tenant_id: claims.tenant_id,
            employee_id: claims.employee_id,
        }
    }
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn issue(
    subject: &TokenSubject,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = Claims {
        user_id: subject.user_id,
        sub: subject.username.clone(),
        role: subject.role,
        tenant_id: subject.tenant_id,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id: subject.employee_id,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn generate_access_token(subject: &TokenSubject, secret: &str, ttl: usize) -> Result<String, Error> {
    issue(subject, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_refresh_token(
    subject: &TokenSubject,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    issue(subject, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: 12,
            username: "kiosk-1".to_string(),
            role: 4,
            tenant_id: 3,
            employee_id: None,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let token = generate_access_token(&subject(), SECRET, 60).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.user_id, 12);
        assert_eq!(claims.sub, "kiosk-1");
        assert_eq!(claims.tenant_id, 3);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_refresh_tokens_have_unique_jti() {
        let (_, a) = generate_refresh_token(&subject(), SECRET, 60).unwrap();
        let (_, b) = generate_refresh_token(&subject(), SECRET, 60).unwrap();
        assert_eq!(a.token_type, TokenType::Refresh);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = generate_access_token(&subject(), SECRET, 60).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Verifies signature and expiry and returns the claims of an access token.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("refresh tokens cannot be used for API access".to_string());
    }

    Ok(claims)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    use super::*;

    pub(crate) const SECRET: &str = "test-secret";

    fn now() -> usize {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
    }

    pub(crate) fn token(role: u8, worker_id: Option<u64>, token_type: TokenType) -> String {
        let claims = Claims {
            user_id: 7,
            sub: "kim".into(),
            role,
            exp: now() + 900,
            jti: Uuid::new_v4().to_string(),
            token_type,
            worker_id,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_access_token() {
        let claims = verify_access_token(&token(3, Some(1000), TokenType::Access), SECRET).unwrap();
        assert_eq!(claims.worker_id, Some(1000));
        assert_eq!(claims.role, 3);
    }

    #[test]
    fn rejects_refresh_token() {
        assert!(verify_access_token(&token(3, Some(1000), TokenType::Refresh), SECRET).is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        assert!(verify_access_token(&token(1, None, TokenType::Access), "other").is_err());
    }
}

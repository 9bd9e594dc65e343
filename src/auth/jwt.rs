use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{Claims, Role};
use crate::error::AppError;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

pub fn encode_token(keys: &JwtKeys, claims: &Claims) -> Result<String, AppError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, claims, &keys.enc)
        .map_err(|err| AppError::internal(format!("Token encoding failed: {err}")))
}

pub fn decode_token(keys: &JwtKeys, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let data = decode::<Claims>(token, &keys.dec, &validation)?;
    Ok(data.claims)
}

pub fn make_access_claims(user_id: &str, role: Role, email: &str, ttl_secs: u64) -> Claims {
    let iat = now_unix();
    Claims {
        sub: user_id.to_string(),
        role,
        email: email.to_string(),
        iat,
        exp: iat + ttl_secs,
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::unauthorized(format!("Invalid or expired token: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{Algorithm, Validation, decode};

    use crate::auth::Claims;

    use super::{JwtKeys, Role, decode_token, encode_token, make_access_claims, now_unix};

    #[test]
    fn makes_claims_with_expected_subject_role_and_ttl() {
        let claims = make_access_claims("user-1", Role::Client, "c@example.com", 60);

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.email, "c@example.com");
        assert_eq!(claims.exp.saturating_sub(claims.iat), 60);
    }

    #[test]
    fn encodes_token_that_can_be_decoded_with_same_secret() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        let claims = make_access_claims("user-2", Role::Admin, "a@example.com", 600);
        let token = encode_token(&keys, &claims).expect("token should encode");

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let decoded =
            decode::<Claims>(&token, &keys.dec, &validation).expect("token should decode");

        assert_eq!(decoded.claims, claims);
        assert_eq!(decode_token(&keys, &token).expect("valid token"), claims);
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        let mut claims = make_access_claims("user-3", Role::Client, "c@example.com", 0);
        claims.iat = now_unix() - 7200;
        claims.exp = now_unix() - 3600;
        let token = encode_token(&keys, &claims).expect("token should encode");

        let err = decode_token(&keys, &token).expect_err("expired token should fail");
        assert!(matches!(err, crate::error::AppError::Unauthorized(_)));
    }

    #[test]
    fn decode_error_carries_reason() {
        let err = decode_token(&JwtKeys::from_secret(b"unit-test-secret"), "not-a-token")
            .expect_err("decode should fail");

        assert!(
            err.message().starts_with("Invalid or expired token:"),
            "unexpected message: {}",
            err.message()
        );
    }
}

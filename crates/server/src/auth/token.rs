use chrono::{Duration, Utc};
use fletia::Usuario;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims we put in, and expect to find in, the JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The account uid.
    pub sub: String,
    /// The role at the time the token was issued. Handlers check the role of
    /// the reloaded account, not this one.
    pub rol: String,
    pub iat: usize,
    pub exp: usize,
}

/// Issues an HS256 session token for `usuario`, valid for `ttl_hours`.
pub fn issue_token(
    secret: &str,
    usuario: &Usuario,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: usuario.uid.clone(),
        rol: usuario.rol.as_str().to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validates the signature and expiry of `token`.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

//! JWT bearer token creation and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_with::{OneOrMany, formats::PreferMany, serde_as};

use crate::{api::models::users::CurrentUser, config::Config, errors::Error, types::UserId};

/// Tokens live for a day.
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Allowed clock skew between issuer and verifier.
const CLOCK_SKEW_SECONDS: u64 = 300;

/// JWT claims.
///
/// `role` accepts both a bare string and an array: single-role tokens are
/// emitted with a scalar claim by some identity stacks, and we verify tokens
/// from either shape.
#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub name: String,
    pub email: String,
    #[serde_as(as = "OneOrMany<_, PreferMany>")]
    pub role: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(user: &CurrentUser, config: &Config) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            name: user.username.clone(),
            email: user.email.clone(),
            role: user.roles.clone(),
            iss: config.jwt_issuer.clone(),
            aud: config.jwt_audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
        }
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.name,
            email: claims.email,
            roles: claims.role,
        }
    }
}

/// Create a signed token for a user.
pub fn create_token(user: &CurrentUser, config: &Config) -> Result<String, Error> {
    let claims = Claims::new(user, config);
    let key = EncodingKey::from_secret(config.jwt_secret_key.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify a token's signature, issuer, audience, and expiry.
pub fn verify_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(config.jwt_secret_key.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_audience(&[&config.jwt_audience]);
    validation.leeway = CLOCK_SKEW_SECONDS;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401): malformed, expired, or mis-issued tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500): key and crypto failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(CurrentUser::from(token_data.claims))
}

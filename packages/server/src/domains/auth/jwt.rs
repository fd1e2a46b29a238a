use anyhow::{bail, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    #[serde(deserialize_with = "deserialize_subject")]
    pub sub: i64, // Subject (user id)
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_permissions")]
    pub permissions: Vec<String>,
    pub exp: i64, // Expiration timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// JWT Service - creates and verifies HS256 tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
}

impl JwtService {
    /// Create a JWT service; tokens must carry `iss` only when an issuer is set
    pub fn new(secret: &str, issuer: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a token for a user
    ///
    /// A negative `ttl` yields a token that is already expired.
    pub fn create_token(
        &self,
        subject_id: i64,
        email: String,
        permissions: Vec<String>,
        ttl: chrono::Duration,
    ) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: subject_id,
            email,
            permissions,
            exp: exp.timestamp(),
            iat: Some(now.timestamp()),
            iss: self.issuer.clone(),
            jti: Some(Uuid::new_v4().to_string()),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if the signature is valid and the token is not expired
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubject {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accept `sub` as a JSON integer, an integral float, or a string of digits
fn deserialize_subject<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawSubject::deserialize(deserializer)?;
    subject_from_raw(raw).map_err(serde::de::Error::custom)
}

fn subject_from_raw(raw: RawSubject) -> Result<i64> {
    match raw {
        RawSubject::Int(id) => Ok(id),
        RawSubject::Float(id) => {
            if id.is_finite() && id.fract() == 0.0 && id.abs() < i64::MAX as f64 {
                Ok(id as i64)
            } else {
                bail!("subject must be an integer, got {}", id)
            }
        }
        RawSubject::Text(id) => match id.parse::<i64>() {
            Ok(id) => Ok(id),
            Err(_) => bail!("subject must be an integer, got {:?}", id),
        },
    }
}

/// `null` and a missing claim both mean no permissions
fn deserialize_permissions<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

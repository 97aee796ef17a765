//! HS512 access tokens.

use std::sync::OnceLock;

use hmac::{Hmac, Mac};
use jwt::{AlgorithmType, Header, SignWithKey, Token, VerifyWithKey};
use mysql::{params, prelude::Queryable, PooledConn};
use sha2::Sha512;

use crate::{config::TokenConfig, libs::time::TIME, Response};

struct TokenKey {
    secret: Vec<u8>,
    expire_secs: i64,
}

impl TokenKey {
    fn from_config(config: &TokenConfig) -> Self {
        TokenKey {
            secret: config.secret.as_bytes().to_vec(),
            expire_secs: config.expire_hours * 3600,
        }
    }
    fn hmac(&self) -> Result<Hmac<Sha512>, hmac::digest::InvalidLength> {
        Hmac::new_from_slice(&self.secret)
    }
}

static TOKEN_KEY: OnceLock<TokenKey> = OnceLock::new();

/// Install the signing key. Later calls are ignored.
pub fn init(config: &TokenConfig) -> Result<(), hmac::digest::InvalidLength> {
    let key = TokenKey::from_config(config);
    key.hmac()?;
    let _ = TOKEN_KEY.set(key);
    Ok(())
}

fn token_key() -> &'static TokenKey {
    TOKEN_KEY.get_or_init(|| TokenKey::from_config(&TokenConfig::default()))
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// user id
    pub id: String,
    /// issued at, unix seconds
    pub iat: i64,
    /// expires at, unix seconds
    pub exp: i64,
    /// issued at, unix nanoseconds, compared against the revocation stamp
    pub nat: i64,
}

impl Claims {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Tokens issued at or before the user's last revocation are dead.
    pub fn is_revoked(&self, tbn: Option<i64>) -> bool {
        tbn.is_some_and(|tbn| tbn >= self.nat)
    }
}

fn nanos(time: TIME) -> i64 {
    time.naos() as i64
}

pub fn generate_jwt(id: &str) -> Result<String, Response> {
    let key = token_key();
    let time = TIME::now()?;
    let now = time.seconds();
    let header = Header {
        algorithm: AlgorithmType::Hs512,
        ..Default::default()
    };
    let claims = Claims {
        id: id.to_owned(),
        iat: now,
        exp: now + key.expire_secs,
        nat: nanos(time),
    };
    let hmac = key.hmac().map_err(Response::internal_server_error)?;
    Token::new(header, claims)
        .sign_with_key(&hmac)
        .map(|t| t.as_str().to_owned())
        .map_err(Response::internal_server_error)
}

/// Check the signature only; expiry and revocation are checked by [`verify`].
pub fn parse_jwt(token: &str) -> Option<Claims> {
    let hmac = token_key().hmac().ok()?;
    let token: Token<Header, Claims, _> = token.verify_with_key(&hmac).ok()?;
    Some(token.claims().clone())
}

/// Resolve a bearer token to the user id it was issued for.
pub fn verify(token: &str, conn: &mut PooledConn) -> Result<String, Response> {
    let claims = parse_jwt(token).ok_or_else(|| Response::token_error("invalid token"))?;
    if claims.is_expired(TIME::now()?.seconds()) {
        return Err(Response::token_error("token expired"));
    }
    let tbn: Option<i64> = conn.exec_first("SELECT tbn FROM token WHERE id = ?", (&claims.id,))?;
    if claims.is_revoked(tbn) {
        return Err(Response::token_error("token revoked, please log in again"));
    }
    Ok(claims.id)
}

/// Revoke every token issued to `id` up to now.
pub fn revoke(id: &str, conn: &mut PooledConn) -> Result<(), Response> {
    let now = nanos(TIME::now()?);
    conn.exec_drop(
        "INSERT INTO token (id, tbn) VALUES (:id, :tbn) ON DUPLICATE KEY UPDATE tbn = :tbn",
        params! { "id" => id, "tbn" => now },
    )?;
    Ok(())
}

#[macro_export]
macro_rules! parse_jwt_macro {
    ($bearer:expr, $conn:expr) => {
        $crate::token::verify($bearer.token(), $conn)?
    };
}

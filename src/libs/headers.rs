use axum::http::{header::AUTHORIZATION, HeaderMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bearer(String);

impl Bearer {
    pub fn token(&self) -> &str {
        &self.0
    }
    /// Pull `Authorization: Bearer <token>` out of the request headers.
    pub fn from_headers(headers: &HeaderMap) -> Option<Bearer> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.trim().split_once(' ')?;
        let token = token.trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(Bearer(token.to_owned()))
        } else {
            None
        }
    }
}

#[macro_export]
macro_rules! bearer {
    ($headers:expr) => {
        match $crate::libs::headers::Bearer::from_headers($headers) {
            Some(bearer) => bearer,
            None => return Err($crate::Response::token_error("missing bearer token")),
        }
    };
    ($headers:expr, Allow Missing) => {
        $crate::libs::headers::Bearer::from_headers($headers)
    };
}

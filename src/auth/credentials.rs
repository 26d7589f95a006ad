use axum::http::{header, HeaderMap};

/// Ambient authentication material carried by the transport.
///
/// Request bodies never contribute to this type; only the `Authorization`
/// header and the session cookie do.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Cookie(String),
    #[default]
    Missing,
}

impl Credentials {
    /// Pick the bearer token if present, otherwise the named session cookie
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        if let Some(token) = bearer_token(headers) {
            return Credentials::Bearer(token);
        }
        if let Some(token) = cookie_value(headers, cookie_name) {
            return Credentials::Cookie(token);
        }
        Credentials::Missing
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Credentials::Bearer(token) | Credentials::Cookie(token) => Some(token),
            Credentials::Missing => None,
        }
    }

    /// Short label for logs; never includes the token itself
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Bearer(_) => "bearer",
            Credentials::Cookie(_) => "cookie",
            Credentials::Missing => "none",
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Missing => write!(f, "Credentials::Missing"),
            other => write!(f, "Credentials::{}(<redacted>)", other.kind()),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .or_else(|| auth_str.strip_prefix("bearer "))?
        .trim();

    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}

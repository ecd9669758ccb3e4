use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const BASIC_TOKEN_USERNAME: &str = "x-token";

#[derive(Debug, PartialEq, Eq)]
pub enum HeaderError {
    InvalidScheme,
    Malformed,
}

/// Extracts a token string from a Basic auth header.
/// Expects format: Basic base64(x-token:actual_token)
pub fn extract_basic_auth_token(header: &str) -> Option<String> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    let (username, password) = credentials.split_once(':')?;
    if username != BASIC_TOKEN_USERNAME {
        return None;
    }

    Some(password.to_string())
}

/// Extracts a token from an Authorization header (Bearer or Basic).
/// Returns `Ok(None)` when no header is present.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Result<Option<String>, HeaderError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    if let Some(token) = header.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err(HeaderError::Malformed);
        }
        return Ok(Some(token.to_string()));
    }

    if header.starts_with("Basic ") {
        return extract_basic_auth_token(header)
            .map(Some)
            .ok_or(HeaderError::Malformed);
    }

    Err(HeaderError::InvalidScheme)
}

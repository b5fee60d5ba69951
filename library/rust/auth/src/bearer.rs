//! Authorization ヘッダーから Bearer トークンを取り出す。

/// ヘッダー形式のエラー。いずれも 401 として扱う。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Authorization header missing")]
    Missing,

    #[error("Invalid Authorization header format")]
    InvalidFormat,
}

/// `Bearer <token>` 形式のヘッダー値からトークン部分を返す。
/// スキーム名の大文字小文字は区別しない。
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, BearerError> {
    let auth_header = header.ok_or(BearerError::Missing)?;

    let parts: Vec<&str> = auth_header.trim().splitn(2, ' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("Bearer") {
        return Err(BearerError::InvalidFormat);
    }

    let token = parts[1].trim();
    if token.is_empty() {
        return Err(BearerError::InvalidFormat);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token() {
        assert_eq!(extract_bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(extract_bearer_token(Some("bearer tok")), Ok("tok"));
        assert_eq!(extract_bearer_token(Some("BEARER tok")), Ok("tok"));
    }

    #[test]
    fn missing_header() {
        assert_eq!(extract_bearer_token(None), Err(BearerError::Missing));
    }

    #[test]
    fn wrong_scheme() {
        assert_eq!(
            extract_bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(BearerError::InvalidFormat)
        );
    }

    #[test]
    fn bare_token_without_scheme() {
        assert_eq!(
            extract_bearer_token(Some("abc.def.ghi")),
            Err(BearerError::InvalidFormat)
        );
    }

    #[test]
    fn empty_token() {
        assert_eq!(
            extract_bearer_token(Some("Bearer   ")),
            Err(BearerError::InvalidFormat)
        );
    }
}

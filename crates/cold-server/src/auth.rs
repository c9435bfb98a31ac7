//! Bearer-token identity. The account service issues HS256 JWTs with the
//! owner's email in `sub`; this server only verifies them against the
//! shared secret. Every failure collapses to 401.

use axum::http::{header, HeaderMap, StatusCode};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

pub(crate) fn verify_bearer(headers: &HeaderMap, secret: &str) -> Result<String, StatusCode> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "token rejected");
        StatusCode::UNAUTHORIZED
    })?;
    let sub = data.claims.sub.trim().to_string();
    if sub.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    fn token(sub: &str, secret: &str, exp: i64) -> String {
        let claims = TestClaims {
            sub: sub.into(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn accepts_a_valid_token() {
        let headers = headers_with(&format!(
            "Bearer {}",
            token("alice@example.org", "s3cret", in_an_hour())
        ));
        assert_eq!(
            verify_bearer(&headers, "s3cret").unwrap(),
            "alice@example.org"
        );
    }

    #[test]
    fn rejects_wrong_secret_missing_header_and_wrong_scheme() {
        let headers = headers_with(&format!(
            "Bearer {}",
            token("alice@example.org", "other", in_an_hour())
        ));
        assert_eq!(verify_bearer(&headers, "s3cret"), Err(StatusCode::UNAUTHORIZED));
        assert_eq!(
            verify_bearer(&HeaderMap::new(), "s3cret"),
            Err(StatusCode::UNAUTHORIZED)
        );
        let headers = headers_with("Basic dXNlcjpwdw==");
        assert_eq!(verify_bearer(&headers, "s3cret"), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn rejects_an_expired_token() {
        let stale = chrono::Utc::now().timestamp() - 3600;
        let headers = headers_with(&format!(
            "Bearer {}",
            token("alice@example.org", "s3cret", stale)
        ));
        assert_eq!(verify_bearer(&headers, "s3cret"), Err(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn rejects_an_empty_subject() {
        let headers = headers_with(&format!("Bearer {}", token("  ", "s3cret", in_an_hour())));
        assert_eq!(verify_bearer(&headers, "s3cret"), Err(StatusCode::UNAUTHORIZED));
    }
}

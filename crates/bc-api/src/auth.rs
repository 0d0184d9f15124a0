use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ApiError;

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

/// Extractor guarding the API routes. Accepts the configured key via
/// `X-API-Key` or `Authorization: Bearer`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    #[allow(dead_code)]
    pub subject: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AuthConfig::from_ref(state);
        authorize_api_key(parts, &config)
    }
}

fn authorize_api_key(parts: &Parts, config: &AuthConfig) -> Result<AuthUser, ApiError> {
    let expected = config
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("API key is not configured".into()))?;

    let provided = parts
        .headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .or_else(|| {
            parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
        });

    match provided {
        Some(key) if key == expected => Ok(AuthUser {
            subject: "api-key".into(),
        }),
        Some(_) => Err(ApiError::Unauthorized("invalid API key".into())),
        None => Err(ApiError::Unauthorized("missing API key".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/matching/run");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn config() -> AuthConfig {
        AuthConfig {
            api_key: Some("secret".into()),
        }
    }

    #[test]
    fn accepts_matching_x_api_key() {
        let parts = parts_with_headers(&[("x-api-key", "secret")]);
        assert!(authorize_api_key(&parts, &config()).is_ok());
    }

    #[test]
    fn accepts_bearer_token() {
        let parts = parts_with_headers(&[("authorization", "Bearer secret")]);
        assert!(authorize_api_key(&parts, &config()).is_ok());
    }

    #[test]
    fn rejects_wrong_or_missing_keys() {
        let wrong = parts_with_headers(&[("x-api-key", "nope")]);
        assert!(matches!(
            authorize_api_key(&wrong, &config()),
            Err(ApiError::Unauthorized(_))
        ));

        let missing = parts_with_headers(&[]);
        assert!(matches!(
            authorize_api_key(&missing, &config()),
            Err(ApiError::Unauthorized(_))
        ));
    }
}

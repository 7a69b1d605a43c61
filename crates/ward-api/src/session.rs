//! Session extraction.
//!
//! The authenticating reverse proxy forwards the verified identity in two
//! headers. The extractor never rejects: a missing or malformed header yields
//! an empty component, and the engine's login precondition turns that into
//! the proper `NOT_LOGGED_IN` failure.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use ward_governance::SessionContext;

/// Header carrying the authenticated email address.
pub const EMAIL_HEADER: &str = "x-auth-email";

/// Header carrying the identity provider key.
pub const PROVIDER_HEADER: &str = "x-auth-provider";

/// The caller's session, extracted from the proxy headers.
#[derive(Debug, Clone)]
pub struct Session(pub SessionContext);

fn header_value(parts: &Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let email = header_value(parts, EMAIL_HEADER);
        let provider = header_value(parts, PROVIDER_HEADER);
        Ok(Session(SessionContext::new(email, provider)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Session {
        let (mut parts, ()) = request.into_parts();
        Session::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_headers_are_normalized() {
        let request = Request::builder()
            .header(EMAIL_HEADER, " Jane@Site.ORG ")
            .header(PROVIDER_HEADER, "Google")
            .body(())
            .unwrap();
        let Session(ctx) = extract(request).await;
        assert_eq!(ctx.identity.email, "jane@site.org");
        assert_eq!(ctx.identity.provider, "google");
        assert!(ctx.identity.is_complete());
    }

    #[tokio::test]
    async fn test_missing_headers_yield_incomplete_identity() {
        let request = Request::builder().body(()).unwrap();
        let Session(ctx) = extract(request).await;
        assert!(!ctx.identity.is_complete());
    }
}

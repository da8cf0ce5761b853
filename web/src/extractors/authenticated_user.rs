use crate::{AppState, Error};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use cookie::Cookie;
use domain::auth::Identity;
use log::*;

/// The verified caller of a request.
///
/// The session token is read from the `Authorization: Bearer` header when
/// present, otherwise from the configured session cookie. Requests without a
/// valid token are rejected with 401 before the handler runs.
pub(crate) struct AuthenticatedUser(pub Identity);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = credential(&parts.headers, state.config.session_cookie_name())
            .ok_or_else(|| {
                debug!("Rejecting {}: no session credential", parts.uri.path());
                Error::unauthorized()
            })?;

        let identity = state.authenticator.authenticate(&credential).await?;
        trace!("Authenticated user {}", identity.user_id);

        Ok(AuthenticatedUser(identity))
    }
}

fn credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// Malformed pairs are skipped; values are percent-decoded and unquoted.
fn cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == cookie_name && !cookie.value_trimmed().is_empty())
        .map(|cookie| cookie.value_trimmed().to_string())
}

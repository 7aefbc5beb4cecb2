use tracing::debug;

use crate::auth::TokenPair;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::models::{PublicUser, Role};
use crate::state::AppState;

/// Cookie carrying the access token
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Access token of the request, from its cookie or else from a bearer Authorization header
pub fn access_token(request: &Request) -> Option<&str> {
    request
        .cookie(ACCESS_COOKIE)
        .or_else(|| {
            request
                .header("Authorization")
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::trim)
        })
        .filter(|token| !token.is_empty())
}

/// Resolve the user behind the request's access token.
///
/// Rejects missing, malformed, badly signed and expired tokens, and tokens of users that no
/// longer exist. The returned user never carries the password hash.
pub fn authenticate(request: &Request, state: &AppState) -> Result<PublicUser> {
    let token = access_token(request)
        .ok_or_else(|| Error::Unauthorized("Unauthorized request, token missing".to_string()))?;

    let claims = state.tokens.verify_access(token).map_err(|err| {
        debug!(error = %err, "Access token rejected");
        Error::Unauthorized("Invalid or expired token".to_string())
    })?;

    let user = state
        .accounts
        .find_user_by_id(claims.id)?
        .ok_or_else(|| Error::Unauthorized("Invalid Access Token, user not found".to_string()))?;

    Ok(PublicUser::from(&user))
}

/// Only let admins through
pub fn require_admin(user: &PublicUser) -> Result<()> {
    match user.role {
        Role::Admin => Ok(()),
        Role::Customer => Err(Error::Forbidden("Admin access required".to_string())),
    }
}

/// Set-Cookie values delivering both tokens.
///
/// Cookies live as long as the token they carry. Production cookies are `Secure` and may be
/// sent cross-site, otherwise they stay `SameSite=Lax`.
pub fn session_cookies(pair: &TokenPair, state: &AppState) -> [String; 2] {
    let attributes = if state.config.production {
        "Path=/; HttpOnly; Secure; SameSite=None"
    } else {
        "Path=/; HttpOnly; SameSite=Lax"
    };

    [
        format!(
            "{}={}; Max-Age={}; {}",
            ACCESS_COOKIE,
            pair.access_token,
            state.tokens.access_ttl().as_secs(),
            attributes
        ),
        format!(
            "{}={}; Max-Age={}; {}",
            REFRESH_COOKIE,
            pair.refresh_token,
            state.tokens.refresh_ttl().as_secs(),
            attributes
        ),
    ]
}

/// Add the session cookies to a response
pub fn attach_session(response: Response, pair: &TokenPair, state: &AppState) -> Response {
    session_cookies(pair, state)
        .iter()
        .fold(response, |response, cookie| {
            response.with_header("Set-Cookie", cookie)
        })
}

use tracing::info;

use super::{parse_body, required};
use crate::api::{LoginRequest, RefreshRequest, RegisterRequest, Session};
use crate::auth::session::attach_session;
use crate::auth::REFRESH_COOKIE;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::models::{NewUser, PublicUser, Role, User};
use crate::routes::HttpParams;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid phone number or password";

/// Issue a token pair for `user` and build the response delivering it
fn open_session(state: &AppState, user: &User, status: u16, message: &str) -> Result<Response> {
    let pair = state.tokens.issue(user)?;
    let session = Session {
        user: PublicUser::from(user),
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
    };
    let response = Response::json(status, session, message)?;
    Ok(attach_session(response, &pair, state))
}

pub fn register(request: Request, _: HttpParams, state: &AppState) -> Result<Response> {
    let body: RegisterRequest = parse_body(&request)?;

    let (Some(name), Some(phone), Some(password)) = (
        required(body.name),
        required(body.phone),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(Error::BadRequest(
            "All fields are required to register user".to_string(),
        ));
    };
    let role = match required(body.role) {
        Some(role) => role.parse::<Role>()?,
        None => Role::Customer,
    };

    if state.accounts.find_user_by_phone(&phone)?.is_some() {
        return Err(Error::Conflict(
            "User with phone number already exists".to_string(),
        ));
    }

    let user = state.accounts.create_user(NewUser {
        name,
        phone,
        password_hash: state.passwords.hash(&password)?,
        role,
    })?;
    info!(user_id = user.id, role = user.role.as_str(), "User registered");

    open_session(state, &user, 201, "User registered successfully")
}

pub fn login(request: Request, _: HttpParams, state: &AppState) -> Result<Response> {
    let body: LoginRequest = parse_body(&request)?;

    let (Some(phone), Some(password)) = (
        required(body.phone),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(Error::BadRequest(
            "Fields not enough to login user".to_string(),
        ));
    };

    let Some(user) = state.accounts.find_user_by_phone(&phone)? else {
        state.passwords.verify_dummy(&password)?;
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };
    if !state.passwords.verify(&password, &user.password_hash)? {
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }
    info!(user_id = user.id, "User logged in");

    open_session(state, &user, 200, "Login successful")
}

/// Trade a refresh token for a new token pair
pub fn refresh(request: Request, _: HttpParams, state: &AppState) -> Result<Response> {
    let token = match request.cookie(REFRESH_COOKIE) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => parse_body::<RefreshRequest>(&request)?
            .refresh_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Unauthorized("Refresh token missing".to_string()))?,
    };

    let claims = state
        .tokens
        .verify_refresh(&token)
        .map_err(|_| Error::Unauthorized("Invalid or expired refresh token".to_string()))?;
    let user = state
        .accounts
        .find_user_by_id(claims.id)?
        .ok_or_else(|| Error::Unauthorized("Invalid refresh token, user not found".to_string()))?;

    open_session(state, &user, 200, "Session refreshed")
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::auth::tokens::RefreshClaims;
    use crate::endpoints::test_support::{call, with_token};
    use crate::routes::paths;
    use crate::state::testing;

    fn register_request(body: serde_json::Value) -> Request {
        Request::post(paths::REGISTER, body.to_string())
    }

    #[test]
    fn test_register() {
        let state = testing::state();
        let (status, session, response) = call::<Session>(
            &state,
            register_request(json!({"name": "Asha", "phone": "9876543210", "password": "pw"})),
        );

        assert_eq!(status, 201);
        let session = session.unwrap();
        assert_eq!(session.user.name, "Asha");
        assert_eq!(session.user.role, Role::Customer);
        assert!(!response.body.contains("argon2"));

        let cookies: Vec<_> = response.header_values("Set-Cookie").collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with(&format!("accessToken={}", session.access_token)));
        assert!(cookies[1].starts_with(&format!("refreshToken={}", session.refresh_token)));

        let stored = state.accounts.find_user_by_phone("9876543210").unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw");
        assert!(state.passwords.verify("pw", &stored.password_hash).unwrap());
    }

    #[test]
    fn test_register_validation() {
        let state = testing::state();

        for body in [
            json!({"phone": "1", "password": "pw"}),
            json!({"name": "A", "password": "pw"}),
            json!({"name": "A", "phone": "1"}),
            json!({"name": "  ", "phone": "1", "password": "pw"}),
            json!({}),
        ] {
            let (status, _, _) = call::<Session>(&state, register_request(body));
            assert_eq!(status, 400);
        }

        let (status, _, response) = call::<Session>(
            &state,
            register_request(json!({"name": "A", "phone": "1", "password": "pw", "role": "CHEF"})),
        );
        assert_eq!(status, 400);
        assert!(response.body.contains("Invalid role provided"));

        let (status, _, _) = call::<Session>(&state, Request::post(paths::REGISTER, "{not json".to_string()));
        assert_eq!(status, 400);
    }

    #[test]
    fn test_register_duplicate_phone() {
        let state = testing::state();
        let body = json!({"name": "Asha", "phone": "9876543210", "password": "pw"});

        let (status, _, _) = call::<Session>(&state, register_request(body.clone()));
        assert_eq!(status, 201);

        let (status, _, response) = call::<Session>(&state, register_request(body));
        assert_eq!(status, 409);
        assert!(response.body.contains("User with phone number already exists"));
    }

    #[test]
    fn test_register_admin() {
        let state = testing::state();
        let (_, session, _) = call::<Session>(
            &state,
            register_request(json!({"name": "Chef", "phone": "1", "password": "pw", "role": "ADMIN"})),
        );
        assert_eq!(session.unwrap().user.role, Role::Admin);
    }

    #[test]
    fn test_register_blank_role_defaults_to_customer() {
        let state = testing::state();
        let (status, session, _) = call::<Session>(
            &state,
            register_request(json!({"name": "Asha", "phone": "1", "password": "pw", "role": ""})),
        );
        assert_eq!(status, 201);
        assert_eq!(session.unwrap().user.role, Role::Customer);

        let (status, session, _) = call::<Session>(
            &state,
            register_request(json!({"name": "Ravi", "phone": "2", "password": "pw", "role": null})),
        );
        assert_eq!(status, 201);
        assert_eq!(session.unwrap().user.role, Role::Customer);
    }

    #[test]
    fn test_login() {
        let state = testing::state();
        call::<Session>(
            &state,
            register_request(json!({"name": "Asha", "phone": "9876543210", "password": "pw"})),
        );

        let (status, session, _) = call::<Session>(
            &state,
            Request::post(paths::LOGIN, json!({"phone": "9876543210", "password": "pw"}).to_string()),
        );
        assert_eq!(status, 200);
        let session = session.unwrap();
        assert_eq!(session.user.phone, "9876543210");
        assert!(state.tokens.verify_access(&session.access_token).is_ok());
    }

    #[test]
    fn test_login_failures_look_the_same() {
        let state = testing::state();
        call::<Session>(
            &state,
            register_request(json!({"name": "Asha", "phone": "9876543210", "password": "pw"})),
        );

        let (wrong_password, _, wrong_password_response) = call::<Session>(
            &state,
            Request::post(paths::LOGIN, json!({"phone": "9876543210", "password": "nope"}).to_string()),
        );
        let (unknown_phone, _, unknown_phone_response) = call::<Session>(
            &state,
            Request::post(paths::LOGIN, json!({"phone": "1111111111", "password": "pw"}).to_string()),
        );

        assert_eq!(wrong_password, 401);
        assert_eq!(unknown_phone, 401);
        assert_eq!(wrong_password_response.body, unknown_phone_response.body);
        assert!(wrong_password_response.header("Set-Cookie").is_none());

        let (status, _, _) = call::<Session>(
            &state,
            Request::post(paths::LOGIN, json!({"phone": "9876543210"}).to_string()),
        );
        assert_eq!(status, 400);
    }

    #[test]
    fn test_refresh() {
        let state = testing::state();
        let (_, session, _) = call::<Session>(
            &state,
            register_request(json!({"name": "Asha", "phone": "9876543210", "password": "pw"})),
        );
        let session = session.unwrap();

        let cookie = format!("refreshToken={}", session.refresh_token);
        let request = Request::post(paths::REFRESH, "".to_string()).with_header("Cookie", &cookie);
        let (status, refreshed, response) = call::<Session>(&state, request);
        assert_eq!(status, 200);
        assert_eq!(refreshed.unwrap().user, session.user);
        assert_eq!(response.header_values("Set-Cookie").count(), 2);

        let body = json!({"refreshToken": session.refresh_token}).to_string();
        let (status, _, _) = call::<Session>(&state, Request::post(paths::REFRESH, body));
        assert_eq!(status, 200);
    }

    #[test]
    fn test_refresh_rejections() {
        let state = testing::state();
        let (_, session, _) = call::<Session>(
            &state,
            register_request(json!({"name": "Asha", "phone": "9876543210", "password": "pw"})),
        );
        let session = session.unwrap();

        let (status, _, _) = call::<Session>(&state, Request::post(paths::REFRESH, "".to_string()));
        assert_eq!(status, 401);

        // An access cookie alone is not enough
        let request = with_token(Request::post(paths::REFRESH, "".to_string()), &session.access_token);
        let (status, _, _) = call::<Session>(&state, request);
        assert_eq!(status, 401);

        // An access token is not a refresh token
        let cookie = format!("refreshToken={}", session.access_token);
        let request = Request::post(paths::REFRESH, "".to_string()).with_header("Cookie", &cookie);
        let (status, _, _) = call::<Session>(&state, request);
        assert_eq!(status, 401);
        let body = json!({"refreshToken": session.access_token}).to_string();
        let (status, _, _) = call::<Session>(&state, Request::post(paths::REFRESH, body));
        assert_eq!(status, 401);

        let claims: RefreshClaims = state.tokens.verify_refresh(&session.refresh_token).unwrap();
        assert_eq!(claims.id, session.user.id);
    }
}

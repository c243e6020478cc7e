use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{normalize_email, Info, LoginRequest, LoginResponse, PublicUser},
        extractors::{AuthUser, BearerToken},
        repo_types::NewUser,
    },
    error::ApiError,
    state::AppState,
    store::StoreError,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(register))
        .route("/user/login", post(login))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/user/logout", post(logout))
        .route("/user/whoami", get(whoami))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let Json(mut user) = payload?;
    user.email = normalize_email(&user.email);

    let user = state.store.users().create(user).await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);

    let session = state
        .sessions
        .authenticate(state.store.users(), &email, &req.password)
        .await?;

    info!(user_id = session.owner_id, "user logged in");
    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        info: "you've successfully logged in",
    }))
}

#[instrument(skip(state, token))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    BearerToken(token): BearerToken,
) -> Json<Info> {
    state.sessions.invalidate(&token).await;
    info!(user_id, "user logged out");
    Json(Info {
        info: "you've successfully logged out",
    })
}

#[instrument(skip(state))]
pub async fn whoami(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    match state.store.users().find_by_id(user_id).await {
        Ok(user) => Ok(Json(user.into())),
        Err(StoreError::NotFound) => {
            warn!(user_id, "session bound to missing user");
            Err(ApiError::Unauthorized("not authenticated".into()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::{json, Value};

    use super::*;
    use crate::app::build_app;
    use crate::testing::call;

    fn parviz() -> Value {
        json!({"name": "Parviz", "email": "User@User.com ", "password": "Password"})
    }

    async fn registered_app() -> Router {
        let app = build_app(AppState::fake());
        let (status, _) = call(&app, Method::POST, "/user/create", None, Some(parviz())).await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    #[tokio::test]
    async fn register_returns_public_user() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::POST, "/user/create", None, Some(parviz())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], 1);
        assert_eq!(body["email"], "user@user.com");
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn register_rejects_invalid_params_and_payload() {
        let app = build_app(AppState::fake());
        let (status, body) = call(
            &app,
            Method::POST,
            "/user/create",
            None,
            Some(json!({"email": "user1@sp", "password": "urt"})),
        )
        .await;
        // missing name is a decode failure, not a validation one
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(
            &app,
            Method::POST,
            "/user/create",
            None,
            Some(json!({"name": "U", "email": "user1@sp", "password": "urt"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"].as_array().unwrap().len(), 3);

        let (status, _) = call(
            &app,
            Method::POST,
            "/user/create",
            None,
            Some(json!("some input")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_cases() {
        let app = registered_app().await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/user/login",
            None,
            Some(json!({"email": "user@user.com", "password": "Password"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

        for payload in [
            json!({"email": "email", "password": "Password"}),
            json!({"email": "user@user.com", "password": "somepassword"}),
        ] {
            let (status, _) = call(&app, Method::POST, "/user/login", None, Some(payload)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, _) =
            call(&app, Method::POST, "/user/login", None, Some(json!("some text"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn whoami_and_logout() {
        let app = registered_app().await;
        let (_, body) = call(
            &app,
            Method::POST,
            "/user/login",
            None,
            Some(json!({"email": "USER@user.com", "password": "Password"})),
        )
        .await;
        let token = body["token"].as_str().unwrap().to_owned();

        let (status, me) = call(&app, Method::GET, "/user/whoami", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["name"], "Parviz");

        let (status, _) = call(&app, Method::GET, "/user/whoami", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::POST, "/user/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, Method::GET, "/user/whoami", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;

use crate::{
    dtos::userdtos::{LoginUserDto, RegisterUserDto, UserData, UserLoginResponseDto, UserResponseDto},
    error::HttpError,
    middleware::{auth, JWTAuthMiddeware},
    service::auth_service::AuthSession,
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_me).layer(middleware::from_fn(auth)))
}

fn token_cookie(app_state: &AppState, token: &str) -> Result<HeaderMap, HttpError> {
    let cookie_duration = time::Duration::minutes(app_state.auth_service.jwt_maxage());
    let cookie = Cookie::build(("token", token.to_owned()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error("Failed to build auth cookie"))?,
    );
    Ok(headers)
}

fn session_response(
    app_state: &AppState,
    status: StatusCode,
    session: AuthSession,
) -> Result<impl IntoResponse, HttpError> {
    let headers = token_cookie(app_state, &session.token)?;

    Ok((
        status,
        headers,
        Json(UserLoginResponseDto {
            status: "success".to_string(),
            token: session.token,
            user: session.user,
        }),
    ))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let session = app_state.auth_service.register(body).await?;
    session_response(&app_state, StatusCode::CREATED, session)
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let session = app_state.auth_service.login(body).await?;
    session_response(&app_state, StatusCode::OK, session)
}

pub async fn get_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state.auth_service.get_me(user.user.id).await?;

    Ok(Json(UserResponseDto {
        status: "success".to_string(),
        data: UserData { user },
    }))
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::instructordtos::{
        CreateInstructorDto, InstructorFilterQuery, InstructorListResponseDto,
        InstructorResponseDto, RequestVerificationDto, StatusQuery, UpdateInstructorDto,
    },
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::{
        instructormodel::{InstructorDetails, VerificationStatus},
        usermodel::UserRole,
    },
    AppState,
};

pub fn instructors_handler() -> Router {
    Router::new()
        .route(
            "/",
            get(find_all).merge(
                post(create_instructor)
                    .layer(middleware::from_fn(|state, req, next| {
                        role_check(state, req, next, vec![UserRole::Admin])
                    }))
                    .layer(middleware::from_fn(auth)),
            ),
        )
        .route(
            "/request-verification",
            post(request_verification).layer(middleware::from_fn(auth)),
        )
        .route(
            "/me",
            get(get_my_profile)
                .patch(update_my_profile)
                .layer(middleware::from_fn(auth)),
        )
        .route(
            "/verification-status",
            get(find_by_verification_status)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Admin])
                }))
                .layer(middleware::from_fn(auth)),
        )
        .route("/:id", get(find_one))
}

fn single(data: InstructorDetails) -> Json<InstructorResponseDto> {
    Json(InstructorResponseDto {
        status: "success".to_string(),
        data,
    })
}

pub async fn create_instructor(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateInstructorDto>,
) -> Result<impl IntoResponse, HttpError> {
    let details = app_state.instructor_service.create(body).await?;
    Ok((StatusCode::CREATED, single(details)))
}

pub async fn find_all(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<InstructorFilterQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let instructors = app_state.instructor_service.find_all(query.into()).await?;

    Ok(Json(InstructorListResponseDto {
        status: "success".to_string(),
        results: instructors.len(),
        instructors,
    }))
}

pub async fn find_one(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let details = app_state.instructor_service.find_one(id).await?;
    Ok(single(details))
}

pub async fn request_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<RequestVerificationDto>,
) -> Result<impl IntoResponse, HttpError> {
    let details = app_state
        .instructor_service
        .request_verification(user.user.id, body)
        .await?;

    Ok((StatusCode::CREATED, single(details)))
}

pub async fn get_my_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let details = app_state.instructor_service.find_mine(user.user.id).await?;
    Ok(single(details))
}

pub async fn update_my_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateInstructorDto>,
) -> Result<impl IntoResponse, HttpError> {
    let details = app_state
        .instructor_service
        .update_mine(user.user.id, body)
        .await?;
    Ok(single(details))
}

pub async fn find_by_verification_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let status = query.status.unwrap_or(VerificationStatus::Pending);
    let instructors = app_state
        .instructor_service
        .find_by_verification_status(status)
        .await?;

    Ok(Json(InstructorListResponseDto {
        status: "success".to_string(),
        results: instructors.len(),
        instructors,
    }))
}

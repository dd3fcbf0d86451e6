use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{
        lessondtos::{
            CreateLessonDto, LessonListResponseDto, LessonResponseDto, LessonUpdatedResponseDto,
            UpdateLessonDto,
        },
        userdtos::Response,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn lessons_handler() -> Router {
    Router::new()
        .route("/", get(find_all).post(create_lesson))
        .route(
            "/:id",
            get(find_one).patch(update_lesson).delete(remove_lesson),
        )
}

pub async fn create_lesson(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateLessonDto>,
) -> Result<impl IntoResponse, HttpError> {
    let lesson = app_state.lesson_service.create(&user.user, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(LessonResponseDto {
            status: "success".to_string(),
            data: lesson,
        }),
    ))
}

pub async fn find_all(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let lessons = app_state.lesson_service.find_all(&user.user).await?;

    Ok(Json(LessonListResponseDto {
        status: "success".to_string(),
        results: lessons.len(),
        lessons,
    }))
}

pub async fn find_one(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let lesson = app_state.lesson_service.find_one(&user.user, id).await?;

    Ok(Json(LessonResponseDto {
        status: "success".to_string(),
        data: lesson,
    }))
}

pub async fn update_lesson(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLessonDto>,
) -> Result<impl IntoResponse, HttpError> {
    let lesson = app_state
        .lesson_service
        .update(&user.user, id, body)
        .await?;

    Ok(Json(LessonUpdatedResponseDto {
        status: "success".to_string(),
        data: lesson,
    }))
}

pub async fn remove_lesson(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.lesson_service.remove(&user.user, id).await?;

    Ok(Json(Response {
        status: "success",
        message: "Lesson removed".to_string(),
    }))
}

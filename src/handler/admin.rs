use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::admindtos::{
        ApprovalData, ApprovalResponseDto, RejectInstructorDto, RejectionResponseDto,
        ReviewQueueResponseDto,
    },
    error::HttpError,
    models::instructormodel::InstructorDetails,
    AppState,
};

/// Review routes. Auth and the ADMIN role check are layered by the router.
pub fn admin_handler() -> Router {
    Router::new()
        .route("/instructors/pending", get(list_pending_instructors))
        .route("/instructors/rejected", get(list_rejected_instructors))
        .route("/instructors/:user_id/approve", post(approve_instructor))
        .route("/instructors/:user_id/reject", post(reject_instructor))
}

fn review_queue(instructors: Vec<InstructorDetails>) -> Json<ReviewQueueResponseDto> {
    Json(ReviewQueueResponseDto {
        status: "success".to_string(),
        results: instructors.len(),
        instructors,
    })
}

pub async fn approve_instructor(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (user, instructor_profile) = app_state.admin_service.approve_instructor(user_id).await?;

    Ok(Json(ApprovalResponseDto {
        status: "success".to_string(),
        message: "Instructor approved".to_string(),
        data: ApprovalData {
            user,
            instructor_profile,
        },
    }))
}

pub async fn reject_instructor(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<RejectInstructorDto>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .admin_service
        .reject_instructor(user_id, body)
        .await?;

    Ok(Json(RejectionResponseDto {
        status: "success".to_string(),
        message: "Instructor rejected".to_string(),
        data: profile,
    }))
}

pub async fn list_pending_instructors(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let instructors = app_state.admin_service.list_pending_instructors().await?;
    Ok(review_queue(instructors))
}

pub async fn list_rejected_instructors(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let instructors = app_state.admin_service.list_rejected_instructors().await?;
    Ok(review_queue(instructors))
}

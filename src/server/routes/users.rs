use crate::db::NewUser;
use crate::error::RosterError;
use crate::server::router::RosterState;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;

/// Success envelope shared by every endpoint. Error cases render through
/// `RosterError::into_response` with the matching `success: false` shape.
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            total: None,
            message: None,
        }
    }
}

pub fn router() -> Router<RosterState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        // Static segment must be its own route so it wins over `{email}`.
        .route("/users/status", get(user_status))
        .route("/users/{email}", get(user_by_email))
}

async fn list_users(State(state): State<RosterState>) -> Result<impl IntoResponse, RosterError> {
    let users = state.store.list_all().await?;
    let total = users.len();

    let mut body = ApiResponse::new(users);
    body.total = Some(total);
    Ok(Json(body))
}

async fn user_status(State(state): State<RosterState>) -> Result<impl IntoResponse, RosterError> {
    let status = state.store.status().await?;
    Ok(Json(ApiResponse::new(status)))
}

async fn user_by_email(
    State(state): State<RosterState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, RosterError> {
    let user = state
        .store
        .find_by_email(&email)
        .await?
        .ok_or(RosterError::NotFound)?;

    Ok(Json(ApiResponse::new(user)))
}

async fn create_user(
    State(state): State<RosterState>,
    Json(body): Json<NewUser>,
) -> Result<impl IntoResponse, RosterError> {
    let user = state.store.create(&body.name, &body.email).await?;

    let mut body = ApiResponse::new(user);
    body.message = Some("User created successfully");
    Ok((StatusCode::CREATED, Json(body)))
}

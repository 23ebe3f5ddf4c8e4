use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    dto::SuccessResponse,
    error::AppError,
    extractors::Payload,
    state::AppState,
    users::dto::{CredentialsRequest, GetRecommendationRequest, SetRecommendationRequest},
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/adduser", post(add_user))
        .route("/login", post(login))
}

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/select_property", post(select_property))
        .route("/getRecommendation", post(get_recommendation))
}

#[instrument(skip(state, payload))]
pub async fn add_user(
    State(state): State<AppState>,
    Payload(payload): Payload<CredentialsRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.users.find_by_name(&payload.name).await?.is_some() {
        warn!(name = %payload.name, "name already registered");
        return Ok(Json(SuccessResponse::new(false)));
    }

    // A concurrent registration can still claim the name between the check
    // and the insert; the store reports that as None.
    match state.users.create(&payload.name, &payload.passwd).await? {
        Some(user) => {
            info!(user_id = user.id, name = %user.name, "user registered");
            Ok(Json(SuccessResponse::new(true)))
        }
        None => {
            warn!(name = %payload.name, "name registered concurrently");
            Ok(Json(SuccessResponse::new(false)))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<CredentialsRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ok = state
        .users
        .credentials_match(&payload.name, &payload.passwd)
        .await?;

    if ok {
        info!(name = %payload.name, "user logged in");
    } else {
        warn!(name = %payload.name, "login failed");
    }
    Ok(Json(SuccessResponse::new(ok)))
}

#[instrument(skip(state, payload))]
pub async fn select_property(
    State(state): State<AppState>,
    Payload(payload): Payload<SetRecommendationRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let updated = state
        .users
        .set_recommendation(&payload.name, payload.recommendation)
        .await?;
    if !updated {
        return Err(AppError::NotFound(payload.name));
    }

    info!(name = %payload.name, recommendation = payload.recommendation, "recommendation set");
    Ok(Json(SuccessResponse::new(true)))
}

#[instrument(skip(state, payload))]
pub async fn get_recommendation(
    State(state): State<AppState>,
    Payload(payload): Payload<GetRecommendationRequest>,
) -> Result<Json<Option<f64>>, AppError> {
    let user = state
        .users
        .find_by_name(&payload.name)
        .await?
        .ok_or(AppError::NotFound(payload.name))?;
    Ok(Json(user.recommendation))
}

use axum::{extract::State, routing::post, Json, Router};
use tracing::{debug, info, instrument};

use crate::{
    diet::{
        dto::{AddFoodRequest, FoodInfoResponse, GetFoodRequest},
        model::{DietError, FoodAdded},
    },
    dto::SuccessResponse,
    error::AppError,
    extractors::Payload,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/addfoodInfo", post(add_food_info))
        .route("/getfoodInfo", post(get_food_info))
}

#[instrument(skip(state, payload), fields(name = %payload.name, date = %payload.date))]
pub async fn add_food_info(
    State(state): State<AppState>,
    Payload(payload): Payload<AddFoodRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let added = state
        .users
        .add_food(&payload.name, &payload.date, &payload.food, payload.calorie)
        .await
        .map_err(|e| match e.downcast::<DietError>() {
            Ok(rejected) => AppError::MalformedInput(rejected.to_string()),
            Err(e) => AppError::Storage(e),
        })?
        .ok_or_else(|| AppError::NotFound(payload.name.clone()))?;

    match added {
        FoodAdded::NewDay => info!(food = %payload.food, "day created"),
        FoodAdded::ExistingDay => debug!(food = %payload.food, "day updated"),
    }
    Ok(Json(SuccessResponse::new(true)))
}

#[instrument(skip(state, payload), fields(name = %payload.name, date = %payload.date))]
pub async fn get_food_info(
    State(state): State<AppState>,
    Payload(payload): Payload<GetFoodRequest>,
) -> Result<Json<FoodInfoResponse>, AppError> {
    let user = state
        .users
        .find_by_name(&payload.name)
        .await?
        .ok_or_else(|| AppError::NotFound(payload.name.clone()))?;

    let table = user.diet_table.unwrap_or_default();
    debug!(days = table.days().len(), "diet table loaded");

    Ok(Json(match table.day(&payload.date) {
        Some(day) => FoodInfoResponse::Day(day.clone()),
        None => FoodInfoResponse::Missing(SuccessResponse::new(false)),
    }))
}

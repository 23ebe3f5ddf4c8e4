use serde::{Deserialize, Serialize};

use crate::diet::model::{Calories, DayRecord};
use crate::dto::SuccessResponse;

/// Request body for `/addfoodInfo`.
#[derive(Debug, Deserialize)]
pub struct AddFoodRequest {
    pub name: String,
    pub date: String,
    pub food: String,
    pub calorie: Calories,
}

/// Request body for `/getfoodInfo`.
#[derive(Debug, Deserialize)]
pub struct GetFoodRequest {
    pub name: String,
    pub date: String,
}

/// Either the day-record itself or `{"success": false}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FoodInfoResponse {
    Day(DayRecord),
    Missing(SuccessResponse),
}

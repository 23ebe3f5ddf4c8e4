use serde::Deserialize;

/// Request body for `/adduser` and `/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub name: String,
    pub passwd: String,
}

/// Request body for `/select_property`.
#[derive(Debug, Deserialize)]
pub struct SetRecommendationRequest {
    pub name: String,
    pub recommendation: f64,
}

/// Request body for `/getRecommendation`.
#[derive(Debug, Deserialize)]
pub struct GetRecommendationRequest {
    pub name: String,
}

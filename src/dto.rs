use serde::Serialize;

/// `{"success": bool}` body shared by the write routes.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn new(success: bool) -> Self {
        Self { success }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub code: u16,
    pub msg: &'static str,
}

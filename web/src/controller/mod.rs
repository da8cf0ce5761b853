use serde::Serialize;
pub(crate) mod health_check_controller;
pub(crate) mod notification_controller;
pub(crate) mod stream_stats_controller;

/// Body of every successful non-snapshot response. Failures use
/// `{"success": false, "message": ...}` from `crate::Error`.
#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    status_code: u16,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            success: true,
            status_code,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn serializes_success_with_data() {
        let response = ApiResponse::new(StatusCode::CREATED.into(), json!({"updated": 3}));

        // Compare as values: key order from serde_json::to_string is not something to rely on
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "status_code": 201, "data": {"updated": 3}})
        );
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// JSON envelope shared by every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(status: StatusCode, data: T) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                status_code: status.as_u16(),
                data: Some(data),
                error: None,
            }),
        )
    }
}

impl ApiResponse<()> {
    pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
        let body = Self {
            status_code: status.as_u16(),
            data: None,
            error: Some(message.into()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_envelope_omits_error() {
        let (status, Json(body)) = ApiResponse::data(StatusCode::CREATED, "x");
        assert_eq!(status, StatusCode::CREATED);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status_code"], 201);
        assert_eq!(json["data"], "x");
        assert!(json.get("error").is_none());
    }
}

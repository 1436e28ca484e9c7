use axum::Json;
use serde::Serialize;
use time::OffsetDateTime;

/// Success envelope shared by every endpoint:
/// `{"success":true,"data":...,"message":...,"timestamp":...}`.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn ok(data: T, message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: message.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let Json(env) = ApiEnvelope::ok(vec![1, 2, 3], "listed");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["message"], "listed");
        assert!(json["timestamp"].is_string());
    }
}

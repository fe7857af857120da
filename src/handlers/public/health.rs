use axum::Json;
use serde_json::{json, Value};

/// GET /health - liveness only, the data source is not probed
pub async fn health_get() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "version": env!("CARGO_PKG_VERSION"),
        }
    }))
}

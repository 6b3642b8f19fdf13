use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Root welcome endpoint
///
/// Confirms the API is reachable.
#[get("/")]
pub async fn welcome() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Welcome to LearnTrack! API is running."
    }))
}

/// Health check endpoint
///
/// Returns the current status of the API and timestamp.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": Utc::now()
    }))
}

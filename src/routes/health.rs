use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Health check endpoint
///
/// Reports whether the datastore answers. An unreachable store is a 500.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    state.store.ping().await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "database": "connected",
        "timestamp": Utc::now()
    })))
}

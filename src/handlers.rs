use actix_web::{http::header::ContentType, web, HttpResponse, Result};
use futures_util::StreamExt;
use serde_json::Value;

use crate::error::PredictError;
use crate::models::{ApiDocs, FeatureVector, HealthResponse, PredictionResponse};
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Largest `/predict` body read before it is treated as unusable.
const MAX_BODY_SIZE: usize = 256 * 1024;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/api").route(web::get().to(api_docs)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/health").route(web::get().to(health)));
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

pub async fn api_docs() -> HttpResponse {
    HttpResponse::Ok().json(ApiDocs::default())
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::new(state.model_loaded()))
}

pub async fn predict(
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, PredictError> {
    let response = handle_prediction(&state, payload).await.map_err(|e| {
        match &e {
            PredictError::ModelUnavailable | PredictError::Inference(_) => {
                tracing::error!(error = %e, "prediction failed");
            }
            _ => tracing::warn!(error = %e, "rejected prediction request"),
        }
        e
    })?;

    Ok(HttpResponse::Ok().json(response))
}

async fn handle_prediction(
    state: &AppState,
    payload: web::Payload,
) -> Result<PredictionResponse, PredictError> {
    let model = state.model().ok_or(PredictError::ModelUnavailable)?;

    // Unreadable, oversized or malformed bodies are treated the same as empty ones.
    let data: Value = match read_body(payload).await {
        Some(body) => serde_json::from_slice(&body).unwrap_or(Value::Null),
        None => Value::Null,
    };
    let features = FeatureVector::from_json(&data)?;

    let class_index = model.classify(&features)?;
    let probabilities = model.class_probabilities(&features)?;

    PredictionResponse::new(class_index, &probabilities, data)
}

async fn read_body(mut payload: web::Payload) -> Option<web::BytesMut> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.ok()?;
        if body.len() + chunk.len() > MAX_BODY_SIZE {
            return None;
        }
        body.extend_from_slice(&chunk);
    }
    Some(body)
}

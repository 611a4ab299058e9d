use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::services::LeadScorer;

#[derive(Deserialize)]
struct TrainExample {
    text: String,
    label: u8,
}

#[derive(Deserialize)]
struct TrainBody {
    examples: Vec<TrainExample>,
}

/// Offline retraining with real labeled conversion data. Takes the scorer
/// write seat, so in-flight scoring reads finish first and no run scores
/// against a half-written model.
#[post("/train")]
async fn train(body: web::Json<TrainBody>, scorer: web::Data<RwLock<LeadScorer>>) -> HttpResponse {
    if body.examples.is_empty() {
        return HttpResponse::BadRequest().body("No training examples provided");
    }
    if body.examples.iter().any(|example| example.label > 1) {
        return HttpResponse::BadRequest().body("Labels must be 0 or 1");
    }

    let examples: Vec<(String, u8)> = body
        .examples
        .iter()
        .map(|example| (example.text.clone(), example.label))
        .collect();

    let mut scorer = scorer.write().await;
    match scorer.train(&examples) {
        Ok(()) => HttpResponse::Ok().body(format!("Model trained on {} examples", examples.len())),
        Err(e) => {
            log::error!("Error training scoring model: {:?}", e);
            HttpResponse::InternalServerError().body("Could not train model")
        }
    }
}

use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    dal::lead_db,
    domain::{contact::extract_contact_info, lead::LeadRecord},
    services::{lead_pipeline, GroqClient, LeadScorer, PipelineSettings, SearchProviders},
};

#[derive(Deserialize)]
struct SearchLeadsBody {
    intent: String,
}

#[post("/search")]
async fn search_leads(
    body: web::Json<SearchLeadsBody>,
    providers: web::Data<SearchProviders>,
    groq_client: web::Data<GroqClient>,
    scorer: web::Data<RwLock<LeadScorer>>,
    settings: web::Data<PipelineSettings>,
) -> HttpResponse {
    let scorer = scorer.read().await;

    let report = lead_pipeline::run(
        &body.intent,
        &providers.providers,
        groq_client.get_ref(),
        &*scorer,
        settings.get_ref(),
    )
    .await;

    HttpResponse::Ok().json(report)
}

#[post("/save")]
async fn save_lead(body: web::Json<LeadRecord>, pool: web::Data<PgPool>) -> HttpResponse {
    let contact = extract_contact_info(&body.details).display();

    match lead_db::insert_lead(&body, &contact, &pool).await {
        Ok(id) => HttpResponse::Ok().json(serde_json::json!({ "id": id })),
        Err(e) => {
            log::error!("Error inserting lead in db: {:?}", e);
            HttpResponse::InternalServerError().body("Could not save lead")
        }
    }
}

#[get("/saved")]
async fn saved_leads(pool: web::Data<PgPool>) -> HttpResponse {
    match lead_db::get_saved_leads(&pool).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => {
            log::error!("Error fetching saved leads: {:?}", e);
            HttpResponse::InternalServerError().body("Could not fetch saved leads")
        }
    }
}

#[delete("/{id}")]
async fn remove_lead(id: web::Path<Uuid>, pool: web::Data<PgPool>) -> HttpResponse {
    match lead_db::delete_lead(*id, &pool).await {
        Ok(0) => HttpResponse::NotFound().body("No such lead"),
        Ok(_) => HttpResponse::Ok().body("Deleted"),
        Err(e) => {
            log::error!("Error deleting lead: {:?}", e);
            HttpResponse::InternalServerError().body("Could not delete lead")
        }
    }
}

#[get("/export")]
async fn export_leads(pool: web::Data<PgPool>) -> HttpResponse {
    let rows = match lead_db::get_saved_leads(&pool).await {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Error fetching leads for export: {:?}", e);
            return HttpResponse::InternalServerError().body("Could not export leads");
        }
    };

    let mut csv = String::from("company,contact,website,details,confidence\n");
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{:.2}\n",
            csv_escape(&row.company),
            csv_escape(&row.contact),
            csv_escape(row.website.as_deref().unwrap_or("")),
            csv_escape(&row.details),
            row.confidence,
        ));
    }

    HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            r#"attachment; filename="saved_leads.csv""#,
        ))
        .body(csv)
}

fn csv_escape(field: &str) -> String {
    match field.contains([',', '"', '\n', '\r']) {
        true => format!("\"{}\"", field.replace('"', "\"\"")),
        false => field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::csv_escape;

    #[test]
    fn plain_field_passes_through() {
        assert_eq!(csv_escape("ACME Corp"), "ACME Corp");
    }

    #[test]
    fn commas_and_quotes_are_quoted() {
        assert_eq!(
            csv_escape(r#"Need 500 "smart" units, urgent"#),
            r#""Need 500 ""smart"" units, urgent""#
        );
    }

    #[test]
    fn newlines_are_quoted() {
        assert_eq!(csv_escape("line one\nline two"), "\"line one\nline two\"");
    }
}

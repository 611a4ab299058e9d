use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    routes::{chat_route, default_route, lead_route, train_route},
    services::{GroqClient, LeadScorer, PipelineSettings, SearchProviders},
};

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    groq_client: GroqClient,
    providers: SearchProviders,
    scorer: RwLock<LeadScorer>,
    pipeline_settings: PipelineSettings,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let groq_client = web::Data::new(groq_client);
    let providers = web::Data::new(providers);
    let scorer = web::Data::new(scorer);
    let pipeline_settings = web::Data::new(pipeline_settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/lead")
                    .service(lead_route::search_leads)
                    .service(lead_route::save_lead)
                    .service(lead_route::saved_leads)
                    .service(lead_route::export_leads)
                    .service(lead_route::remove_lead),
            )
            .service(web::scope("/chat").service(chat_route::chat))
            .service(web::scope("/app").service(train_route::train))
            .app_data(db_pool.clone())
            .app_data(groq_client.clone())
            .app_data(providers.clone())
            .app_data(scorer.clone())
            .app_data(pipeline_settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

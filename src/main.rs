use std::{net::TcpListener, path::PathBuf, sync::Arc, time::Duration};

use env_logger::Env;
use prospect::{
    configuration::get_configuration,
    services::{
        DirectorySearchClient, GoogleSearchClient, GroqClient, LeadScorer, PipelineSettings,
        RetryPolicy, ScrapeClient, SearchProvider, SearchProviders,
    },
    startup::run,
};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let pool_options = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)) // 15 minutes
        .max_lifetime(None);

    let connection_pool = pool_options.connect_lazy_with(configuration.database.with_db());
    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;

    let groq_client = GroqClient::new(
        configuration.api_keys.groq.clone(),
        configuration.api_keys.groq_model,
    );

    // Provider-list order is the merge order of raw results.
    let mut providers: Vec<Arc<dyn SearchProvider>> = vec![
        Arc::new(GoogleSearchClient::new(
            configuration.api_keys.google_search,
            configuration.api_keys.google_cx,
        )),
        Arc::new(DirectorySearchClient::new(
            configuration.api_keys.groq,
            configuration.api_keys.directory_search_url,
        )),
    ];
    if let Some(target_url) = configuration.api_keys.scrape_target_url {
        providers.push(Arc::new(ScrapeClient::new(target_url)));
    }
    let providers = SearchProviders { providers };

    let scorer = LeadScorer::load_or_seed(
        PathBuf::from(configuration.pipeline.vectorizer_path),
        PathBuf::from(configuration.pipeline.classifier_path),
    );

    let pipeline_settings = PipelineSettings {
        max_candidates: configuration.pipeline.max_candidates,
        min_confidence: configuration.pipeline.min_confidence,
        retry: RetryPolicy {
            max_attempts: configuration.pipeline.max_retries,
            base_delay: Duration::from_secs(1),
        },
    };

    run(
        listener,
        connection_pool,
        groq_client,
        providers,
        RwLock::new(scorer),
        pipeline_settings,
    )?
    .await
}

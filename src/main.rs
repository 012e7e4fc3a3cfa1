// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use daily_quiz::config::Config;
use daily_quiz::engine::{bridge::EventBridge, runtime::SessionRegistry};
use daily_quiz::routes;
use daily_quiz::state::AppState;
use daily_quiz::store::MemoryStore;
use daily_quiz::models::question::CreateQuestionRequest;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Backing store and event bridge
    let store = Arc::new(MemoryStore::new());
    let bridge = Arc::new(EventBridge::new());

    // Seed the question bank
    if let Err(e) = seed_questions(&store, &config).await {
        tracing::error!("Failed to seed question bank: {:?}", e);
    }

    // Session engine
    let registry = Arc::new(SessionRegistry::new(
        Arc::clone(&bridge),
        store.clone(),
        store.clone(),
        config.timer_settings(),
        Duration::from_millis(config.tick_millis),
    ));

    // Create AppState
    let state = AppState {
        store,
        registry,
        bridge,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}

/// Loads questions from the JSON file named by SEED_QUESTIONS, if set.
/// Skips entries the bank rejects instead of aborting startup.
async fn seed_questions(
    store: &MemoryStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &config.seed_questions else {
        return Ok(());
    };

    let raw = tokio::fs::read_to_string(path).await?;
    let requests: Vec<CreateQuestionRequest> = serde_json::from_str(&raw)?;
    let total = requests.len();

    let mut seeded = 0usize;
    for request in requests {
        match store.add_question(request).await {
            Ok(_) => seeded += 1,
            Err(e) => tracing::warn!("Skipping seed question: {}", e),
        }
    }
    tracing::info!("Seeded {}/{} questions from {}", seeded, total, path);
    Ok(())
}

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use rentmatch::config::{LoggingSettings, SemanticSettings, Settings};
use rentmatch::core::{DailyMatchJob, SemanticMatcher};
use rentmatch::routes::{self, AppState};
use rentmatch::services::{CachedEmbedder, HttpEmbedder, PostgresStore, RunLock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

/// RUST_LOG wins over the configured level
fn init_logging(logging: &LoggingSettings) -> std::io::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true);

    let result = match logging.format.as_str() {
        "pretty" => subscriber.pretty().try_init(),
        "json" => subscriber.json().try_init(),
        _ => subscriber.try_init(),
    };
    result.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

fn build_semantic(settings: &SemanticSettings) -> SemanticMatcher {
    if !settings.enabled {
        return SemanticMatcher::default();
    }

    match HttpEmbedder::new(
        settings.endpoint.clone(),
        settings.model.clone(),
        settings.api_key.clone(),
        settings.timeout(),
    ) {
        Ok(embedder) => {
            info!(
                "Semantic matching enabled ({} via {}, cache: {} entries)",
                settings.model, settings.endpoint, settings.cache_capacity
            );
            SemanticMatcher::new(Arc::new(CachedEmbedder::new(embedder, settings.cache_capacity)))
        }
        Err(e) => {
            warn!("Failed to build embedding client ({}), semantic signal stays neutral", e);
            SemanticMatcher::default()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging)?;

    info!("Starting Rentmatch service...");
    info!("Configuration loaded successfully");

    let store = Arc::new(
        PostgresStore::from_settings(
            &settings.database.url,
            settings.database.max_connections,
            settings.database.min_connections,
            settings.database.acquire_timeout_secs,
            settings.database.idle_timeout_secs,
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!(
        "PostgreSQL store initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    // Run lock is optional: without it the scheduler must never overlap runs
    let run_lock = if settings.run_lock.enabled {
        let lock = RunLock::new(
            &settings.run_lock.redis_url,
            Duration::from_secs(settings.run_lock.ttl_secs),
        )
        .await
        .map_err(|e| startup_error("Failed to connect to Redis for the run lock", e))?;
        info!("Run lock enabled (TTL: {}s)", settings.run_lock.ttl_secs);
        Some(lock)
    } else {
        None
    };

    let matching = settings.matching_config();
    info!(
        "Matcher initialized (top_k: {}, enhancement: {}, neighborhoods: {})",
        matching.top_k,
        matching.enhancement_enabled,
        matching.neighborhoods.len()
    );
    let job = DailyMatchJob::new(matching).with_semantic(build_semantic(&settings.semantic));

    // Build application state
    let app_state = AppState::new(store, job, settings.engagement, run_lock);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes::<PostgresStore>)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

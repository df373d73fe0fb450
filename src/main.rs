use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use sharehub_match::auth::TokenVerifier;
use sharehub_match::config::{Settings, StoreBackend};
use sharehub_match::core::Matcher;
use sharehub_match::error::{handle_json_payload_error, handle_query_payload_error};
use sharehub_match::routes;
use sharehub_match::services::{
    ChannelNotifier, Geocoder, HttpMailer, LogMailer, Mailer, MemoryStore, NominatimGeocoder,
    NoopGeocoder, PostgresStore, ProfileStore, SiteInfo,
};
use sharehub_match::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("Configuration error: {}", e)))?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting ShareHub matching service...");

    let store: Arc<dyn ProfileStore> = match settings.store.backend {
        StoreBackend::Postgres => {
            let postgres = PostgresStore::from_settings(
                &settings.database.url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!("PostgreSQL store initialized");
            Arc::new(postgres)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let geocoder: Arc<dyn Geocoder> = if settings.geocoder.enabled {
        let nominatim = NominatimGeocoder::new(
            settings.geocoder.base_url.clone(),
            settings.geocoder.user_agent.clone(),
            Duration::from_secs(settings.geocoder.timeout_secs),
            settings.geocoder.cache_size,
            Duration::from_secs(settings.geocoder.cache_ttl_secs),
        )
        .map_err(|e| startup_error("Failed to build geocoder", e))?;

        info!("Geocoder initialized ({})", settings.geocoder.base_url);
        Arc::new(nominatim)
    } else {
        info!("Geocoding disabled, new locations stay unresolved");
        Arc::new(NoopGeocoder)
    };

    let mailer: Arc<dyn Mailer> = match &settings.mail.relay_url {
        Some(relay_url) => {
            let http = HttpMailer::new(
                relay_url.clone(),
                settings.mail.api_key.clone(),
                settings.mail.from_address.clone(),
                settings.mail.reply_to.clone(),
                Duration::from_secs(settings.mail.timeout_secs),
            )
            .map_err(|e| startup_error("Failed to build mailer", e))?;

            info!("Mail relay configured ({})", relay_url);
            Arc::new(http)
        }
        None => {
            info!("No mail relay configured, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let (notifier, _worker) = ChannelNotifier::spawn(
        store.clone(),
        mailer,
        SiteInfo {
            name: settings.mail.site_name.clone(),
            url: settings.mail.site_url.clone(),
        },
    );

    let rules = settings.scoring_rules();
    let matcher = Matcher::new(
        rules,
        settings.matching.default_radius_km,
        settings.matching.max_radius_km,
    );

    info!("Matcher initialized with rules: {:?}", rules);

    let app_state = AppState {
        store,
        geocoder,
        notifier: Arc::new(notifier),
        matcher,
        tokens: TokenVerifier::new(
            &settings.auth.jwt_secret,
            settings.auth.issuer.as_deref(),
            settings.auth.leeway_secs,
        ),
        regeocode_on_edit: settings.geocoder.regeocode_on_edit,
    };

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
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

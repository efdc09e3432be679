use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;

mod config;
mod controllers;
mod db;
mod error;
mod models;
mod rate_limit;

use config::Config;
use db::Database;
use rate_limit::counter::{HitCounter, MemoryCounter, RedisCounter};
use rate_limit::middleware::RateLimitGuard;
use rate_limit::RateLimiter;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
}

/// SPA fallback handler - serves index.html for client-side routing
async fn spa_fallback() -> actix_web::Result<NamedFile> {
    if std::path::Path::new("./client/dist/index.html").exists() {
        Ok(NamedFile::open("./client/dist/index.html")?)
    } else {
        Ok(NamedFile::open("../client/dist/index.html")?)
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Jotter v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    // Admission gate counter: shared Redis when configured, otherwise an
    // in-process counter whose budget is per instance.
    let counter: Arc<dyn HitCounter> = match config.redis_url.as_deref() {
        Some(url) => {
            log::info!("[RATE_LIMIT] Using shared counter store at {}", url);
            Arc::new(
                RedisCounter::connect(url)
                    .await
                    .expect("Failed to connect to the counter store"),
            )
        }
        None => {
            log::warn!(
                "[RATE_LIMIT] {} not set - using in-process counter (limit applies per instance)",
                config::env_vars::REDIS_URL
            );
            Arc::new(MemoryCounter::new())
        }
    };

    log::info!(
        "[RATE_LIMIT] {} requests per {}s window, {} key",
        config.rate_limit_max,
        config.rate_limit_window_secs,
        config.rate_limit_key_strategy.as_str()
    );
    let limiter = Arc::new(RateLimiter::new(
        counter,
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
        config.rate_limit_key_strategy,
    ));

    // Determine frontend dist path (check both locations)
    // Set DISABLE_FRONTEND=1 to disable static file serving (for separate dev server)
    let frontend_dist = if std::env::var(config::env_vars::DISABLE_FRONTEND)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
    {
        log::info!("Frontend serving disabled via DISABLE_FRONTEND env var");
        ""
    } else if std::path::Path::new("./client/dist").exists() {
        "./client/dist"
    } else if std::path::Path::new("../client/dist").exists() {
        "../client/dist"
    } else {
        log::warn!("Frontend dist not found in ./client/dist or ../client/dist - static file serving disabled");
        ""
    };

    let dev_mode = config.dev_mode;
    if dev_mode {
        log::warn!("Dev mode enabled - CORS is wide open");
    }

    log::info!("Starting Jotter server on port {}", port);
    if !frontend_dist.is_empty() {
        log::info!("Serving frontend from: {}", frontend_dist);
    }

    let state_db = db.clone();
    let app_config = config.clone();
    let frontend_dist = frontend_dist.to_string();

    let server = HttpServer::new(move || {
        let cors = if dev_mode {
            Cors::permissive()
        } else {
            Cors::default()
        };

        let mut app = App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&state_db),
                config: app_config.clone(),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .service(
                web::scope("/notes")
                    .wrap(RateLimitGuard::new(Arc::clone(&limiter)))
                    .configure(controllers::notes::config),
            );

        // Serve static files only if frontend dist exists
        if !frontend_dist.is_empty() {
            app = app.service(
                Files::new("/", frontend_dist.clone())
                    .index_file("index.html")
                    .default_handler(actix_web::web::to(spa_fallback)),
            );
        }

        app
    })
    .bind(("0.0.0.0", port))?
    .run();

    // Get server handle for graceful shutdown
    let server_handle = server.handle();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        log::info!("Received Ctrl+C, shutting down...");
        server_handle.stop(true).await;
        log::info!("Shutdown complete");
    });

    server.await
}

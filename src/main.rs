use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;

use rust_school_reports::config::{AppConfig, CorsConfig};
use rust_school_reports::models::AppStartTime;
use rust_school_reports::routes;
use rust_school_reports::runtime::lifetime;
use rust_school_reports::utils::{json_error_handler, query_error_handler};

/// 初始化日志，开发环境输出文件与行号，其余环境输出 JSON
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .with_writer(writer)
        .event_format(
            tracing_subscriber::fmt::format()
                .with_level(true)
                .with_ansi(true),
        );

    if config.is_development() {
        builder.with_file(true).with_line_number(true).init();
    } else {
        builder.json().init();
    }
    guard
}

/// 按配置构造 CORS，`*` 表示放开对应项
fn build_cors(cors: &CorsConfig) -> Cors {
    let wildcard = |items: &[String]| items.iter().any(|item| item == "*");

    let mut builder = Cors::default().max_age(cors.max_age);
    builder = if wildcard(&cors.allowed_origins) {
        builder.allow_any_origin()
    } else {
        cors.allowed_origins
            .iter()
            .fold(builder, |b, origin| b.allowed_origin(origin))
    };
    builder = if wildcard(&cors.allowed_methods) {
        builder.allow_any_method()
    } else {
        builder.allowed_methods(cors.allowed_methods.iter().map(String::as_str))
    };
    if wildcard(&cors.allowed_headers) {
        builder.allow_any_header()
    } else {
        builder.allowed_headers(cors.allowed_headers.iter().map(String::as_str))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    setup_panic!();
    AppConfig::init().map_err(std::io::Error::other)?;
    let config = AppConfig::get();
    let _log_guard = init_tracing(config);

    warn!(
        "Starting {} ({} v{}, {} environment)",
        config.app.system_name,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.app.environment
    );

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(std::io::Error::other)?;
    let storage = startup.storage;
    let cache = startup.cache;

    debug!(
        "Pre-startup processing completed in {} ms",
        chrono::Utc::now()
            .signed_duration_since(app_start_time.start_datetime)
            .num_milliseconds()
    );
    warn!("Using {} worker threads", config.server.workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config.cors))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate"))
                    .add(("X-Content-Type-Options", "nosniff")),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PayloadConfig::new(config.server.limits.max_payload_size))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .configure(routes::configure_auth_routes)
            .configure(routes::configure_user_routes)
            .configure(routes::configure_category_routes)
            .configure(routes::configure_report_assignment_routes)
            .configure(routes::configure_submission_routes)
            .configure(routes::configure_report_routes)
            .configure(routes::configure_notification_routes)
            .configure(routes::configure_system_routes)
    })
    .keep_alive(std::time::Duration::from_secs(
        config.server.timeouts.keep_alive,
    ))
    .client_request_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_request,
    ))
    .client_disconnect_timeout(std::time::Duration::from_millis(
        config.server.timeouts.client_disconnect,
    ))
    .workers(config.server.workers);

    #[cfg(unix)]
    let server = match config.unix_socket_path() {
        Some(socket_path) => {
            warn!("Starting server on Unix socket: {}", socket_path);
            if std::path::Path::new(socket_path).exists() {
                std::fs::remove_file(socket_path)?;
            }
            server.bind_uds(socket_path)?
        }
        None => {
            let bind_address = config.server_bind_address();
            warn!("Starting server at http://{}", bind_address);
            server.bind(bind_address)?
        }
    };

    #[cfg(not(unix))]
    let server = {
        let bind_address = config.server_bind_address();
        warn!("Starting server at http://{}", bind_address);
        server.bind(bind_address)?
    };

    tokio::select! {
        res = server.run() => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}

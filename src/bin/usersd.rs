use std::sync::Arc;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;

use userfacade::logging::setup_tracing;
use userfacade::{
    ConfigOverrides, HttpUserApi, ServerConfig, StaticUserApi, UserApi, UserService,
    create_router,
};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(optional, "Base URL of the upstream user provider")]
    upstream_url: Option<String>,
    #[arrrg(optional, "Upstream request timeout in milliseconds")]
    upstream_timeout_ms: Option<u64>,
    #[arrrg(optional, "Serve users from a JSON file instead of the upstream provider")]
    fixture: Option<String>,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            host: args.host,
            port: args.port,
            upstream_url: args.upstream_url,
            upstream_timeout_ms: args.upstream_timeout_ms,
            fixture: args.fixture,
            verbose: args.verbose,
        }
    }
}

const HELP_TEXT: &str = r#"usersd - user API over a read-only upstream listing

USAGE:
    usersd [OPTIONS]

OPTIONS:
    --host <HOST>                 Host to bind the HTTP server [env: HOST] [default: 127.0.0.1]
    --port <PORT>                 Port to bind the HTTP server [env: PORT] [default: 3000]
    --upstream-url <URL>          Upstream base URL [env: UPSTREAM_URL]
                                  [default: https://jsonplaceholder.typicode.com]
    --upstream-timeout-ms <MS>    Upstream request timeout [env: UPSTREAM_TIMEOUT_MS] [default: 10000]
    --fixture <PATH>              Serve users from a JSON array file instead of the upstream
    --verbose                     Enable verbose logging

DESCRIPTION:
    Variables missing from the environment are read from ./.env when present.

    Creates, updates, and deletes are computed and returned but never stored;
    the upstream listing is the only source of truth.

    The server supports graceful shutdown via Ctrl+C.

API ENDPOINTS:
    GET    /                  Health check
    GET    /users             List users (?username=&email= filters)
    POST   /users             Create a user
    GET    /users/{id}        Get a user
    PUT    /users/{id}        Update a user
    PATCH  /users/{id}        Update a user
    DELETE /users/{id}        Delete a user"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: usersd [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }

    let config = ServerConfig::from_overrides(args.into())?;
    setup_tracing(config.verbose);

    let api: Arc<dyn UserApi> = match &config.fixture {
        Some(path) => {
            tracing::info!(fixture = %path.display(), "serving users from fixture");
            Arc::new(StaticUserApi::from_json_file(path)?)
        }
        None => {
            tracing::info!(
                upstream = %config.upstream_url,
                timeout_ms = config.upstream_timeout.as_millis() as u64,
                "serving users from upstream"
            );
            Arc::new(HttpUserApi::new(
                config.upstream_url.clone(),
                config.upstream_timeout,
            )?)
        }
    };

    let app = create_router(UserService::new(api));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(%addr, "usersd listening");

    let shutdown_signal = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("shutdown signal received, stopping server");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("usersd stopped");
    Ok(())
}

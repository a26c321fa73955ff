use std::time::Duration;

use bookshelf::cli::{Args, build_config, init_logging, load_signing_secret, open_database};
use bookshelf::{init_cleanup, run_server};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(secret) = load_signing_secret(args.secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database, Duration::from_secs(args.store_timeout)).await
    else {
        std::process::exit(1);
    };

    let listener = tokio::net::TcpListener::bind(&args.listen_addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %args.listen_addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap_or_else(|e| {
        error!(error = %e, "Failed to read listener address");
        std::process::exit(1);
    });

    let config = build_config(db, secret, args.enable_revocation);
    init_cleanup(&config).await;

    info!(
        address = %local_addr,
        revocation = config.revocation,
        "Listening"
    );

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

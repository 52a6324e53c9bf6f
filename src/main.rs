use clap::Parser;
use popsocial::cli::{
    Args, build_config, generated_key_env, init_logging, load_key_material, open_database,
    validate_client_origin,
};
use popsocial::run_server;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.generate_keys {
        match generated_key_env() {
            Ok(env) => println!("{}", env),
            Err(e) => {
                eprintln!("Failed to generate keys: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    init_logging(&args.log_format);

    let Some(keys) = load_key_material(&args) else {
        std::process::exit(1);
    };

    let Some(client_origin) = validate_client_origin(&args.client_origin) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let Some(config) = build_config(&args, db, keys, &client_origin) else {
        std::process::exit(1);
    };

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(_) => info!(address = %addr, "Listening"),
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

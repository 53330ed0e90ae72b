//! Bluesky Media Archiver - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use bsky_media_archiver::{
    api::XrpcClient,
    cli::Args,
    config::{validate_config, Config, RunMode},
    download::{archive_account, delete_account_entries, restore_downloads},
    error::{exit_codes, Error, Result},
    ledger::Ledger,
    output::{
        print_banner, print_config_summary, print_error, print_info, print_run_stats,
        print_success, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            ExitCode::from(exit_code_for(&e) as u8)
        }
    }
}

fn exit_code_for(error: &Error) -> i32 {
    match error {
        Error::Config(_)
        | Error::ConfigValidation { .. }
        | Error::MissingConfig(_)
        | Error::TomlParse(_)
        | Error::UrlParse(_) => exit_codes::CONFIG_ERROR,
        Error::Api(_)
        | Error::RateLimited(_)
        | Error::HandleNotFound(_)
        | Error::RetriesExhausted { .. }
        | Error::Http(_)
        | Error::Json(_) => exit_codes::API_ERROR,
        Error::InvalidFilename(_) | Error::Io(_) => exit_codes::DOWNLOAD_ERROR,
        _ => exit_codes::UNEXPECTED_ERROR,
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        print_info(&format!(
            "No configuration file at {}, using defaults and CLI arguments",
            config_path.display()
        ));
        Config::default()
    };

    args.merge_into_config(&mut config);
    validate_config(&mut config)?;

    let account = config.account_identifier()?.to_string();
    let feed_types: Vec<String> = config
        .options
        .feed_types
        .iter()
        .map(|f| f.to_string())
        .collect();
    print_config_summary(
        &account,
        &config.options.mode.to_string(),
        &feed_types,
        &config.download_directory().display().to_string(),
    );

    let api = XrpcClient::from_config(&config)?;
    let database_path = config.database_path()?;
    tracing::debug!("Using ledger at {}", database_path.display());
    let ledger = Ledger::open(&database_path).await?;

    let result = match config.options.mode {
        RunMode::DeleteAccount => delete_account_entries(&api, &ledger, &config)
            .await
            .map(|(did, removed)| {
                if removed > 0 {
                    print_success(&format!("Deleted {} rows for {}", removed, did));
                } else {
                    print_warning("No matching rows found");
                }
                exit_codes::SUCCESS
            }),
        RunMode::Archive | RunMode::Restore => {
            let stats = if config.options.mode == RunMode::Restore {
                restore_downloads(&api, &ledger, &config).await
            } else {
                archive_account(&api, &ledger, &config).await
            };
            stats.map(|stats| {
                print_run_stats(&account, &stats);
                if stats.has_failures() {
                    print_warning("Some posts could not be archived; rerun to retry them");
                    exit_codes::DOWNLOAD_ERROR
                } else {
                    exit_codes::SUCCESS
                }
            })
        }
    };

    ledger.close().await;
    result
}

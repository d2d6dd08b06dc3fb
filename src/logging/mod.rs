//! Tracing setup: console plus daily rolling files.

pub mod config;
pub mod middleware;

use std::io;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

pub use config::{LogConfig, LogLevel};

/// Install the global subscriber. The returned guards flush the background
/// writers on drop and must live as long as the process.
pub fn init(config: &LogConfig) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "event_studio_backend={},tower_http=debug,axum=info,sqlx=warn",
            config.level
        ))
    });

    let (console_writer, guard) = non_blocking(io::stdout());
    guards.push(guard);

    let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();

    if config.production {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(console_writer)
                .with_target(false)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(console_writer)
                .with_target(true)
                .pretty()
                .boxed(),
        );
    }

    if let Some(dir) = &config.dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("log directory {} unavailable: {}", dir.display(), e);
        } else {
            let (file_writer, guard) = non_blocking(rolling::daily(dir, "app.log"));
            guards.push(guard);
            let (error_writer, guard) = non_blocking(rolling::daily(dir, "error.log"));
            guards.push(guard);

            if config.production {
                layers.push(
                    fmt::layer()
                        .json()
                        .with_writer(file_writer)
                        .with_file(true)
                        .with_line_number(true)
                        .with_thread_ids(true)
                        .boxed(),
                );
            } else {
                layers.push(
                    fmt::layer()
                        .with_writer(file_writer)
                        .with_ansi(false)
                        .with_file(true)
                        .with_line_number(true)
                        .boxed(),
                );
            }
            layers.push(
                fmt::layer()
                    .json()
                    .with_writer(error_writer)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(LevelFilter::ERROR)
                    .boxed(),
            );
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .init();

    tracing::info!(
        production = config.production,
        level = %config.level,
        "logging initialised"
    );
    guards
}

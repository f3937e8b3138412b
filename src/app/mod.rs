pub mod client;
pub mod config;
pub mod logging_system;
pub mod pipeline;

pub use client::{Client, ClientConfig, ClientError, DroppedEvent, PublishReport};
pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging};
pub use pipeline::{ParseError, Pipeline, PipelineStats, Publisher};

use std::process;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{error, info};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct App {
    config: Config,
    client: Client,
}

impl App {
    pub async fn from_args<I, T>(args: I) -> Result<Self, BoxError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args_and_env(args)?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> Result<Self, BoxError> {
        setup_logging(config.log_level, config.log_format)?;

        info!("Starting logsight-forwarder v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Configuration: url={}, batch_size={}, auto_create={}, input={}",
            config.url,
            config.batch_size,
            config.auto_create,
            config
                .input
                .as_ref()
                .map_or_else(|| "stdin".to_string(), |p| p.display().to_string())
        );

        let client = Client::from_config(&config).await?;
        Ok(Self { config, client })
    }

    pub async fn run(self) -> Result<PipelineStats, BoxError> {
        let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &self.config.input {
            Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
            None => Box::new(BufReader::new(tokio::io::stdin())),
        };

        let pipeline = Pipeline::new(
            self.client,
            self.config.batch_size,
            self.config.retry_policy(),
        );

        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler; run until the input ends
                std::future::pending::<()>().await;
            }
        };

        let stats = pipeline.run(reader, shutdown).await?;

        let client = pipeline.into_publisher();
        let connection = client.connection_stats();
        info!(
            "Requests: {} total, {} failed, {} logins, avg {:?}",
            connection.total_requests,
            connection.failed_requests,
            connection.logins,
            connection.average_response_time
        );
        client.close();

        Ok(stats)
    }
}

pub async fn main() -> Result<(), BoxError> {
    let args: Vec<String> = std::env::args().collect();

    match App::from_args(args).await {
        Ok(app) => match app.run().await {
            Ok(stats) => {
                info!(
                    "logsight-forwarder stopped: {} acked, {} dropped",
                    stats.acked, stats.dropped
                );
            }
            Err(e) => {
                error!("Application error: {e}");
                process::exit(1);
            }
        },
        Err(e) => {
            // Logging may not be up yet
            eprintln!("Startup error: {e}");
            error!("Startup error: {e}");
            process::exit(1);
        }
    }

    Ok(())
}

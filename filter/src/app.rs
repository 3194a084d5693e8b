//! Core application

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::core::cli::{self, Commands};
use crate::core::config::FilterConfig;
use crate::core::constants::{APP_NAME, ENV_LOG};
use crate::data::{InMemoryPropertyService, PropertyFixture, PropertyFormat};
use crate::filters::{Condition, FilterService, catalog};
use crate::utils::file::{expand_path, read_input};

pub struct CoreApp {
    pub config: FilterConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: FilterConfig::load(&cli_config)?,
        };
        let cancel = Self::cancel_on_signal();
        let mut stdout = std::io::stdout().lock();
        app.execute(command, &cancel, &mut stdout).await
    }

    /// Run one command, writing its JSON result to `out`
    pub async fn execute(
        &self,
        command: Commands,
        cancel: &CancellationToken,
        out: &mut impl Write,
    ) -> Result<()> {
        let result = match command {
            Commands::Query {
                query,
                properties,
                space,
                endpoint,
            } => {
                let service = self.filter_service(&properties)?;
                let nodes = service
                    .compile_query(&space, &query, endpoint.as_deref(), cancel)
                    .await?;
                serde_json::to_value(nodes)?
            }
            Commands::Expression {
                body,
                properties,
                space,
            } => {
                let service = self.filter_service(&properties)?;
                let body = read_input(&body)?;
                let node = service.compile_expression(&space, &body, cancel).await?;
                serde_json::to_value(node)?
            }
            Commands::Conditions { format } => Self::conditions(format),
        };

        serde_json::to_writer_pretty(&mut *out, &result).context("Failed to write output")?;
        writeln!(out)?;
        Ok(())
    }

    fn filter_service(&self, properties: &Path) -> Result<FilterService> {
        let fixture = PropertyFixture::load(&expand_path(&properties.to_string_lossy()))?;
        let service = InMemoryPropertyService::new(fixture);
        Ok(FilterService::new(Arc::new(service), &self.config))
    }

    /// Public conditions, for one format or keyed by every format
    fn conditions(format: Option<PropertyFormat>) -> Value {
        let tokens = |format: PropertyFormat| -> Value {
            catalog::public_conditions_for(format)
                .into_iter()
                .map(|condition: Condition| Value::from(condition.as_str()))
                .collect()
        };
        match format {
            Some(format) => tokens(format),
            None => PropertyFormat::ALL
                .into_iter()
                .map(|format| (format.as_str().to_string(), tokens(format)))
                .collect::<Map<String, Value>>()
                .into(),
        }
    }

    /// Token cancelled on Ctrl+C, so in-flight property calls stop early
    fn cancel_on_signal() -> CancellationToken {
        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Received Ctrl+C, cancelling");
                guard.cancel();
            }
        });
        cancel
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}

//! CLI runner - executes commands

use crate::auth::AuthConfig;
use crate::cli::commands::{Cli, Commands, GetArgs, OutputFormat};
use crate::client::{Client, ClientBuilder};
use crate::config::ClientConfig;
use crate::decode::Payload;
use crate::error::{Result, ResultExt};
use crate::pipeline::Context;
use crate::types::{Method, QueryMap};
use futures::StreamExt;
use std::io::Write;
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Get(args) => self.get(args).await,
            Commands::Validate => self.validate(),
        }
    }

    fn load_config(&self) -> Result<ClientConfig> {
        match &self.cli.config {
            Some(path) => ClientConfig::from_file(path),
            None => Ok(ClientConfig::default()),
        }
    }

    /// Command-line flags layered over the config file
    fn client_config(&self, args: &GetArgs) -> Result<ClientConfig> {
        let mut config = self.load_config()?;
        if let Some(concurrency) = args.concurrency {
            config.pagination.concurrency = concurrency;
        }
        if let Some(max_pages) = args.max_pages {
            config.pagination.max_pages = max_pages;
        }
        if let Some(token) = &args.token {
            config.auth = AuthConfig::Token {
                token: token.clone(),
            };
        }
        if let Some(token) = &args.bearer {
            config.auth = AuthConfig::Bearer {
                token: token.clone(),
            };
        }
        config.headers.extend(args.headers.iter().cloned());
        Ok(config)
    }

    async fn get(&self, args: &GetArgs) -> Result<()> {
        let client = Client::from_config(&self.client_config(args)?)?;
        let query: QueryMap = args.params.iter().cloned().collect();
        let request = client.prepare(Method::GET, &args.url, query)?;
        let decoder = args.decode.decoder();

        if !args.paginate && !args.concurrent {
            let payload = client
                .fetch(request, Context::new(), &*decoder)
                .await?;
            return self.emit(&payload);
        }

        let start = Instant::now();
        let mut pages = if args.concurrent {
            client.paginate_concurrent(request, Context::new(), decoder)
        } else {
            client.paginate(request, Context::new(), decoder)
        };

        let mut count = 0;
        while let Some(page) = pages.next().await {
            self.emit(&page?)?;
            count += 1;
        }
        info!("Fetched {} pages in {:?}", count, start.elapsed());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = ClientBuilder::from_config(&config)
            .and_then(ClientBuilder::build)
            .context("Invalid client configuration")?;
        println!(
            "Configuration is valid (stages: {})",
            client.pipeline().stage_names().join(" → ")
        );
        Ok(())
    }

    fn emit(&self, payload: &Payload) -> Result<()> {
        let line = match (payload, self.cli.format) {
            (Payload::Json(value), OutputFormat::Pretty) => serde_json::to_string_pretty(value)?,
            _ => payload.to_string(),
        };
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}")?;
        Ok(())
    }
}

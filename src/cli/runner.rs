//! CLI runner - executes commands

use crate::api::Portal;
use crate::auth::{token, AuthEvent};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PortalConfig;
use crate::error::{Result, ResultExt};
use crate::http::ApiRequest;
use crate::types::{JsonValue, Method};
use serde_json::json;
use tokio::sync::broadcast;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let portal = self.build_portal()?;
        let mut events = portal.client().subscribe();

        let result = self.execute(&portal).await;
        Self::report_session_events(&mut events);
        result
    }

    /// Resolve configuration and build the portal clients
    fn build_portal(&self) -> Result<Portal> {
        let mut config = PortalConfig::discover(self.cli.config.as_deref())?;
        if let Some(url) = &self.cli.base_url {
            config.base_url = Some(url.clone());
        }
        Portal::from_config(&config)
    }

    async fn execute(&self, portal: &Portal) -> Result<()> {
        match &self.cli.command {
            Commands::Login { username, password } => {
                let response = portal.auth().login(username, password).await?;
                self.output(&json!({"status": "logged_in", "user": response.user}));
            }
            Commands::Logout => {
                portal.auth().logout().await?;
                self.output(&json!({"status": "logged_out"}));
            }
            Commands::Profile => {
                let profile = portal.auth().profile().await?;
                self.output(&profile);
            }
            Commands::Status => self.status(portal).await?,
            Commands::Refresh => {
                let access = portal.client().refresh().await?;
                self.output(&json!({
                    "status": "refreshed",
                    "access_expires_at": token::expires_at(&access).map(|t| t.to_rfc3339()),
                }));
            }
            Commands::Check => {
                let reachable = portal.client().check_connection().await;
                self.output(&json!({
                    "base_url": portal.client().config().base_url,
                    "reachable": reachable,
                }));
            }
            Commands::Dashboard => {
                let stats = portal.education().dashboard_stats().await?;
                self.output(&stats);
            }
            Commands::Request {
                method,
                path,
                json,
                query,
            } => {
                let method: Method = method.parse()?;
                let mut request = ApiRequest::new(method, path.as_str()).queries(query.iter().cloned());
                if let Some(body) = json {
                    let body: JsonValue =
                        serde_json::from_str(body).context("Invalid --json body")?;
                    request = request.json(&body)?;
                }
                let response: JsonValue = portal.client().request_json(request).await?;
                self.output(&response);
            }
        }
        Ok(())
    }

    /// Describe the stored session without revealing tokens
    async fn status(&self, portal: &Portal) -> Result<()> {
        let credentials = portal.client().credentials();
        let access = credentials.access_token().await?;
        let refresh = credentials.refresh_token().await?;

        self.output(&json!({
            "base_url": portal.client().config().base_url,
            "has_access_token": access.is_some(),
            "has_refresh_token": refresh.is_some(),
            "access_expires_at": access
                .as_deref()
                .and_then(token::expires_at)
                .map(|t| t.to_rfc3339()),
            "access_expired": access.as_deref().map(token::is_expired),
            "user": credentials.user_info().await?,
        }));
        Ok(())
    }

    /// Print a re-login hint if the session was lost during the command
    fn report_session_events(events: &mut broadcast::Receiver<AuthEvent>) {
        while let Ok(event) = events.try_recv() {
            if let AuthEvent::Unauthenticated { reason } = event {
                eprintln!("Session ended ({reason}). Run `eduportal login` to sign in again.");
            }
        }
    }

    /// Output a JSON document
    fn output(&self, value: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(value).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
    }
}

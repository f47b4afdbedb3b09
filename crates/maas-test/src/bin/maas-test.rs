//! maas-test CLI - exercise a MAAS 2.0 controller one action at a time.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use maas_test::controller::maas::{ControllerArgs, MaasController};
use maas_test::{Dispatcher, LogConfig, Session, Settings, Stdout, WorkflowOptions};

/// maas-test CLI - run one workflow against a MAAS controller.
#[derive(Parser)]
#[command(name = "maas-test")]
#[command(about = "Exercise a MAAS 2.0 controller", version)]
struct Cli {
    /// Controller base URL (or set `MAAS_URL` env var).
    #[arg(long, env = "MAAS_URL", default_value = "http://192.168.100.2/MAAS")]
    base_url: String,

    /// API key as `consumer:token:secret` (or set `MAAS_API_KEY` env var).
    #[arg(long, env = "MAAS_API_KEY", default_value = "", hide_env_values = true)]
    creds: String,

    /// Parent machine hostname for `create-device` and `container`.
    #[arg(long, default_value = "")]
    parent: String,

    /// Buffer `add-file` content and fetch `read-file` directly by name.
    #[arg(long, default_value = "false")]
    read: bool,

    /// Enable trace logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Action to run: allocate, release, start, create-device,
    /// delete-devices, list-files, add-file, read-file, delete-file,
    /// container, unlink-subnet. Without one the controller is inspected.
    action: Option<String>,

    /// Action arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            base_url: self.base_url.clone(),
            api_key: self.creds.clone(),
            timeout: Duration::from_secs(self.timeout),
            workflow: WorkflowOptions::new(self.read, self.parent.as_str()),
            logging: LogConfig::new(self.debug),
        }
    }
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("base_url", &self.base_url)
            .field("creds", &"<redacted>")
            .field("parent", &self.parent)
            .field("read", &self.read)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("action", &self.action)
            .field("args", &self.args)
            .finish()
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = cli.settings();
    settings.logging.install()?;

    info!(url = %settings.base_url, "Connecting to MAAS controller");
    let controller = MaasController::connect(ControllerArgs {
        base_url: settings.base_url.clone(),
        api_key: settings.api_key.clone(),
        timeout: settings.timeout,
    })
    .await
    .context("Failed to connect to MAAS controller")?;
    debug!(capabilities = ?controller.capabilities(), "Connected");

    let dispatcher = Dispatcher::standard(&settings.logging);
    let session = Session::new(&controller, &settings.workflow, &Stdout);
    let action = cli.action.as_deref().unwrap_or_default();

    match dispatcher.dispatch(&session, action, &cli.args).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_action_and_args() {
        let cli = Cli::try_parse_from([
            "maas-test",
            "--base-url",
            "http://maas.local/MAAS",
            "--parent",
            "node1",
            "--read",
            "unlink-subnet",
            "dev1",
            "eth0",
            "sub-a",
        ])
        .unwrap();

        assert_eq!(cli.action.as_deref(), Some("unlink-subnet"));
        assert_eq!(cli.args, vec!["dev1", "eth0", "sub-a"]);

        let settings = cli.settings();
        assert_eq!(settings.base_url, "http://maas.local/MAAS");
        assert!(settings.workflow.read_direct);
        assert_eq!(settings.workflow.parent.as_deref(), Some("node1"));
        assert!(!settings.logging.verbose);
    }

    #[test]
    fn test_debug_hides_creds() {
        let cli = Cli::try_parse_from(["maas-test", "--creds", "ck:tk:topsecret", "list-files"])
            .unwrap();
        let rendered = format!("{cli:?}");
        assert!(!rendered.contains("topsecret"), "{rendered}");
        assert!(rendered.contains("list-files"));

        let settings = cli.settings();
        assert!(!format!("{settings:?}").contains("topsecret"));
    }

    #[test]
    fn test_no_action_defaults() {
        let cli = Cli::try_parse_from(["maas-test", "--timeout", "5"]).unwrap();
        assert_eq!(cli.action, None);
        assert!(cli.args.is_empty());

        let settings = cli.settings();
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.workflow.parent, None);
    }
}

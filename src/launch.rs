use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use argh::FromArgs;
use cnc::built_info::{PKG_NAME, PKG_VERSION};
use cnc::config::Config;
use cnc::console::{Console, Renderer};
use cnc::grouping::Grouping;
use cnc::sync::{Session, SyncClient};
use exitcode::ExitCode;
use tokio::io::BufReader;
use tracing::{error, info};

use crate::{groups, validate};

fn default_worker_threads() -> usize {
    std::env::var("CNC_WORKER_THREADS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|threads| *threads > 0)
        .unwrap_or(2)
}

#[derive(FromArgs)]
#[argh(
    description = "Choose which targets of a fleet get profiled",
    help_triggers("-h", "--help")
)]
pub struct RootCommand {
    #[argh(switch, short = 'v', description = "show version")]
    version: bool,

    #[argh(
        option,
        short = 'l',
        default = "\"info\".to_string()",
        description = "log level, overridden by CNC_LOG"
    )]
    log_level: String,

    #[argh(switch, description = "write logs as JSON")]
    json_logs: bool,

    #[argh(option, short = 'c', long = "config", description = "read configuration from file")]
    config: Option<PathBuf>,

    #[argh(option, description = "rules server address, overrides the config file")]
    address: Option<String>,

    #[argh(
        option,
        short = 't',
        default = "default_worker_threads()",
        description = "specify how many threads the Tokio runtime will use"
    )]
    threads: usize,

    #[argh(subcommand)]
    sub_commands: Option<SubCommands>,
}

impl RootCommand {
    #![allow(clippy::print_stdout)]
    fn show_version(&self) {
        println!("{PKG_NAME} {PKG_VERSION}");
    }

    fn load_config(&self) -> Result<Config, ExitCode> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).map_err(|err| {
                error!(message = "Load config failed", ?path, %err);
                exitcode::CONFIG
            })?,
            None => Config::default(),
        };

        if let Some(address) = &self.address {
            config.address = address.clone();
            config.validate().map_err(handle_config_errors)?;
        }

        Ok(config)
    }

    pub fn run(&self) -> Result<(), ExitCode> {
        if self.version {
            self.show_version();
            return Ok(());
        }

        if let Some(sub_command) = &self.sub_commands {
            return sub_command.run();
        }

        cnc::trace::init(&self.log_level, self.json_logs);

        let config = self.load_config()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("cnc-worker")
            .worker_threads(self.threads)
            .enable_io()
            .enable_time()
            .build()
            .map_err(|err| {
                error!(message = "Build tokio runtime failed", %err);
                exitcode::OSERR
            })?;

        let result = runtime.block_on(async move {
            info!(
                message = "Start cnc",
                address = %config.address,
                group_by = ?config.group_by,
                threads = self.threads,
            );

            let client = SyncClient::new(Grouping::new(config.group_by.clone()));
            let (session, handle) =
                Session::new(config.connector(), client, config.reconnect.backoff());

            let session = tokio::spawn(session.run(async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!(message = "Listen for ctrl-c failed", %err);
                    std::future::pending::<()>().await;
                }

                info!(message = "Shutdown signal received");
            }));

            // quitting the console drops the last handle, which stops the session
            let console = Console::new(handle, Renderer::new(std::io::stdout().is_terminal()));
            console.run(BufReader::new(tokio::io::stdin())).await;

            match session.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(err)) => {
                    error!(message = "Session stopped", %err);
                    Err(exitcode::UNAVAILABLE)
                }
                Err(err) => {
                    error!(message = "Session task failed", %err);
                    Err(exitcode::SOFTWARE)
                }
            }
        });

        // reading stdin blocks a thread which cannot be joined
        runtime.shutdown_timeout(Duration::from_secs(1));

        result
    }
}

pub fn handle_config_errors(errors: Vec<String>) -> ExitCode {
    for err in errors {
        error!(message = "Configuration error", %err);
    }

    exitcode::CONFIG
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum SubCommands {
    Groups(groups::Groups),
    Validate(validate::Validate),
}

impl SubCommands {
    fn run(&self) -> Result<(), ExitCode> {
        let code = match self {
            SubCommands::Groups(groups) => groups.run(),
            SubCommands::Validate(validate) => validate.run(),
        };

        match code {
            exitcode::OK => Ok(()),
            other => Err(other),
        }
    }
}

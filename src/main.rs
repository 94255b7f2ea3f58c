//! Binary entry point for the DevPod Civo machine provider.

use std::env;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::Level;

use devpod_civo::{
    CivoApi, CivoApiError, CivoConfig, ConfigError, Credentials, KeypairError,
    LifecycleReconciler, MachineEnv, OptionsMode, ProviderOptions, ReconcileError, RemoteError,
    RemoteSession, access_token, bootstrap, keypair,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("key pair error: {0}")]
    Keypair(#[from] KeypairError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError<CivoApiError>),
    #[error("remote command failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("instance {instance_id} has no public IP address")]
    MissingPublicIp { instance_id: String },
    #[error("failed to write output: {0}")]
    Output(String),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    // stdout carries the status/token outputs the host parses, so all
    // diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Init => init_account(),
        Cli::Create => create_machine().await,
        Cli::Start => start_machine().await,
        Cli::Stop => stop_machine().await,
        Cli::Delete => delete_machine().await,
        Cli::Status => print_status().await,
        Cli::Command => run_remote_command().await,
        Cli::Token => print_token(),
    }
}

/// Wires configuration, credentials, and the API client into a reconciler.
fn load_reconciler(mode: OptionsMode) -> Result<LifecycleReconciler<CivoApi>, CliError> {
    let config = CivoConfig::load_without_cli_args()?;
    let credentials = Credentials::resolve(&config)?;
    let options = ProviderOptions::resolve(&config, &credentials, mode, &MachineEnv::from_env())?;
    let api = CivoApi::new(&credentials);
    Ok(LifecycleReconciler::new(api, options)?)
}

fn init_account() -> Result<i32, CliError> {
    let config = CivoConfig::load_without_cli_args()?;
    let credentials = Credentials::resolve(&config)?;
    ProviderOptions::resolve(
        &config,
        &credentials,
        OptionsMode::Init,
        &MachineEnv::from_env(),
    )?;
    let _api = CivoApi::new(&credentials);
    Ok(0)
}

async fn create_machine() -> Result<i32, CliError> {
    let reconciler = load_reconciler(OptionsMode::OperateWithKeys)?;
    let public_key = machine_public_key(&reconciler)?;
    reconciler.create(&public_key).await?;
    Ok(0)
}

async fn start_machine() -> Result<i32, CliError> {
    let reconciler = load_reconciler(OptionsMode::OperateWithKeys)?;
    let public_key = machine_public_key(&reconciler)?;
    reconciler.start(&public_key).await?;
    Ok(0)
}

async fn stop_machine() -> Result<i32, CliError> {
    let reconciler = load_reconciler(OptionsMode::Operate)?;
    reconciler.stop().await?;
    Ok(0)
}

async fn delete_machine() -> Result<i32, CliError> {
    let reconciler = load_reconciler(OptionsMode::Operate)?;
    reconciler.delete().await?;
    Ok(0)
}

async fn print_status() -> Result<i32, CliError> {
    let reconciler = load_reconciler(OptionsMode::Operate)?;
    let status = reconciler.status().await?;
    write_stdout(&status.to_string())?;
    Ok(0)
}

async fn run_remote_command() -> Result<i32, CliError> {
    let command = env::var("COMMAND")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingVariable { name: "COMMAND" })?;

    let reconciler = load_reconciler(OptionsMode::OperateWithKeys)?;
    let instance = reconciler.resolve_instance().await?;
    let public_ip = instance
        .public_ip
        .clone()
        .ok_or(CliError::MissingPublicIp {
            instance_id: instance.id,
        })?;
    let machine_folder = machine_folder(&reconciler)?;
    let session = RemoteSession::new(
        public_ip,
        bootstrap::BOOTSTRAP_USER,
        keypair::private_key_path(&machine_folder),
    );

    Ok(session.stream(&command)?)
}

fn print_token() -> Result<i32, CliError> {
    let config = CivoConfig::load_without_cli_args()?;
    let token = access_token(&config)?;
    write_stdout(&token)?;
    Ok(0)
}

fn machine_public_key(reconciler: &LifecycleReconciler<CivoApi>) -> Result<String, CliError> {
    let folder = machine_folder(reconciler)?;
    Ok(keypair::public_key(&folder)?)
}

fn machine_folder(
    reconciler: &LifecycleReconciler<CivoApi>,
) -> Result<camino::Utf8PathBuf, CliError> {
    reconciler
        .options()
        .machine_folder
        .clone()
        .ok_or_else(|| CliError::Config(ConfigError::MissingVariable {
            name: "MACHINE_FOLDER",
        }))
}

fn write_stdout(line: &str) -> Result<(), CliError> {
    writeln!(io::stdout(), "{line}").map_err(|err| CliError::Output(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_every_lifecycle_subcommand() {
        for name in [
            "init", "create", "start", "stop", "delete", "status", "command", "token",
        ] {
            let parsed = Cli::try_parse_from(["devpod-civo", name]);
            assert!(parsed.is_ok(), "subcommand {name} should parse");
        }
    }

    #[test]
    fn write_error_renders_the_message() {
        let mut buf = Vec::new();
        let err = CliError::MissingPublicIp {
            instance_id: String::from("inst-1"),
        };
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).unwrap_or_else(|err2| panic!("utf8: {err2}"));
        assert!(
            rendered.contains("instance inst-1 has no public IP address"),
            "rendered: {rendered}"
        );
    }

    #[test]
    fn config_errors_keep_the_variable_name_visible() {
        let err = CliError::Config(ConfigError::MissingVariable {
            name: "CIVO_API_KEY",
        });
        assert!(err.to_string().contains("CIVO_API_KEY"));
    }
}

//! Command-line interface definitions for the `devpod-civo` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.
//!
//! Every subcommand maps to one DevPod machine-provider operation. The host
//! orchestrator passes all inputs through the environment, so the subcommands
//! take no arguments of their own.

use clap::Parser;

/// Top-level CLI for the `devpod-civo` binary.
#[derive(Debug, Parser)]
#[command(
    name = "devpod-civo",
    about = "DevPod machine provider for Civo compute instances",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Validate credentials and provider configuration.
    #[command(name = "init", about = "Validate credentials and provider configuration")]
    Init,
    /// Create the workspace instance (and its volume, when configured).
    #[command(name = "create", about = "Create the workspace instance")]
    Create,
    /// Recreate the workspace instance from its persistent volume.
    #[command(name = "start", about = "Start the workspace instance")]
    Start,
    /// Tear down the instance while keeping its persistent volume.
    #[command(name = "stop", about = "Stop the workspace instance")]
    Stop,
    /// Delete the instance together with its persistent volume.
    #[command(name = "delete", about = "Delete the workspace instance")]
    Delete,
    /// Report the observed machine status.
    #[command(name = "status", about = "Report the observed machine status")]
    Status,
    /// Run the `COMMAND` environment value on the instance over SSH.
    #[command(name = "command", about = "Run a command on the instance over SSH")]
    Command,
    /// Print the portable credential token.
    #[command(name = "token", about = "Print the portable credential token")]
    Token,
}

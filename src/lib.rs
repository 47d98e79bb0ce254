//! fhir-inspect library.
//!
//! This crate provides the types, command handlers, and aggregation core
//! that power the `fhir-inspect` binary. Library consumers can drive the
//! [`aggregate`] / [`render`] modules directly against their own record
//! source to build element statistics without the CLI surface.

pub mod aggregate;
pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod output;
pub mod path;
pub mod render;
pub mod tree;
pub mod walk;

use cli::{Cli, Commands};
use client::{FhirClient, ServerInfo};
use colored::Colorize;
use commands::inspect::InspectOpts;
use error::{CliError, CliResult};

/// Dispatch a parsed [`Cli`] to the appropriate command handler.
///
/// Every mode starts with a CapabilityStatement fetch; if the server is
/// unreachable the run ends there with a connection error.
pub async fn run(cli: Cli) -> CliResult<()> {
    let quiet = cli.quiet;
    let validate = !cli.no_validation;

    match cli.command {
        Commands::Resources { url, zero } => {
            let (client, info) = connect(&url, quiet).await?;
            commands::resources::run(&client, &info, zero, quiet).await
        }

        Commands::Inspect {
            url,
            resource,
            items,
            level,
            limit,
            include_absent,
        } => {
            let (client, _info) = connect(&url, quiet).await?;
            let opts = InspectOpts {
                items,
                level,
                limit,
                include_absent,
                validate,
            };
            commands::inspect::run(&client, &resource, &opts, quiet).await
        }

        Commands::Structures { url } => {
            let (client, _info) = connect(&url, quiet).await?;
            commands::structures::run(&client, quiet).await
        }
    }
}

/// Check the connection and print the remote server identity.
async fn connect(url: &str, quiet: bool) -> CliResult<(FhirClient, ServerInfo)> {
    let client = FhirClient::new(url);
    if !quiet {
        println!("Checking connection to FHIR server \"{url}\"...");
    }

    let info = client.metadata().await.map_err(|source| CliError::Connect {
        url: url.to_string(),
        source,
    })?;

    if !quiet {
        let remote = format!(
            "Remote: {} {} (FHIR version: {})",
            info.software_name.as_deref().unwrap_or("unknown"),
            info.software_version.as_deref().unwrap_or(""),
            info.fhir_version.as_deref().unwrap_or("unknown"),
        );
        println!("{}", remote.green());
    }

    Ok((client, info))
}

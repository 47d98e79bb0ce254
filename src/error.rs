use crate::aggregate::AggregateError;
use crate::client::FetchError;
use colored::Colorize;
use std::fmt;
use std::process;

/// Exit codes for the CLI. Usage errors exit with 2 via clap before any
/// command runs, so only the error path is exercised here.
#[allow(dead_code)]
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
#[allow(dead_code)]
pub const EXIT_USAGE: i32 = 2;

/// Unified error type for CLI operations.
pub enum CliError {
    /// The initial connection / CapabilityStatement fetch failed.
    Connect { url: String, source: FetchError },
    /// A fetch against the server failed.
    Fetch(FetchError),
    /// An aggregation run aborted mid-fetch.
    Aggregate(AggregateError),
    /// The inspected resource type has no instances on the server.
    NoInstances { resource_type: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Connect { url, source } => write!(
                f,
                "{} connection to FHIR server \"{url}\" failed: {source}",
                "error:".red().bold()
            ),
            CliError::Fetch(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::Aggregate(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::NoInstances { resource_type } => write!(
                f,
                "{} no resources of type \"{resource_type}\" found on server",
                "error:".red().bold()
            ),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<AggregateError> for CliError {
    fn from(e: AggregateError) -> Self {
        CliError::Aggregate(e)
    }
}

/// Print error and exit non-zero.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("{err}");
    process::exit(EXIT_ERROR)
}

pub type CliResult<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_error_reports_processed_count() {
        let err = CliError::Aggregate(AggregateError::Fetch {
            source: FetchError::Network("connection reset".to_string()),
            processed: 12,
        });
        let msg = format!("{err}");
        assert!(msg.contains("after 12 instance(s)"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_no_instances_names_the_type() {
        let err = CliError::NoInstances {
            resource_type: "Observation".to_string(),
        };
        assert!(format!("{err}").contains("\"Observation\""));
    }
}

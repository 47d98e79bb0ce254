//! Resource census: per-type instance counts across the whole server.
//!
//! Unlike an inspection run, a failed count for one type is reported inline
//! and the census continues; the rows are independent of each other.

use crate::client::{FhirClient, ServerInfo};
use crate::error::CliResult;
use crate::output::{self, CensusRow};
use colored::Colorize;
use tracing::warn;

pub async fn run(client: &FhirClient, info: &ServerInfo, zero: bool, quiet: bool) -> CliResult<()> {
    if !quiet {
        println!(
            "Fetching list of resources of FHIR server \"{}\"...",
            client.base_url()
        );
        println!(
            "{} resource types on server. Receiving count of each resource type...",
            info.resource_types.len()
        );
    }

    // Alphabetical for a stable, scannable report; the CapabilityStatement
    // order is server-defined.
    let mut types: Vec<&str> = info.resource_types.iter().map(String::as_str).collect();
    types.sort_unstable();

    let bar = output::progress_bar(types.len() as u64, "Counting", quiet);
    let mut rows = Vec::new();
    let mut failures = 0usize;

    for resource_type in types {
        let count = client.count(resource_type).await;
        if let Err(e) = &count {
            failures += 1;
            warn!("count of {resource_type} failed: {e}");
        }
        rows.push(CensusRow {
            resource_type: resource_type.to_string(),
            count,
        });
        bar.inc(1);
    }
    bar.finish_and_clear();

    // Zero-count rows are noise on most servers; failed rows always show.
    let rows: Vec<CensusRow> = rows
        .into_iter()
        .filter(|row| zero || !matches!(row.count, Ok(0)))
        .collect();

    if !quiet {
        let done = format!("Processed {} resource types.", info.resource_types.len());
        println!("{}", done.green());
        if failures > 0 {
            eprintln!(
                "{}",
                format!("{failures} count request(s) failed.").yellow()
            );
        }
        println!();
    }
    println!("{}", output::census_table(&rows));

    Ok(())
}

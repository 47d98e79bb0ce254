//! List the structure definitions known to the server.

use crate::client::FhirClient;
use crate::error::CliResult;
use crate::output;
use serde_json::Value;

pub async fn run(client: &FhirClient, quiet: bool) -> CliResult<()> {
    if !quiet {
        println!(
            "Fetching structure definitions of FHIR server \"{}\"...",
            client.base_url()
        );
    }

    let bar = output::spinner("Receiving structure definitions...", quiet);
    let mut pages = client.search("StructureDefinition");
    let mut rows = Vec::new();

    while let Some(page) = pages.next_page().await? {
        for resource in &page {
            let text = |key: &str| {
                resource
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            rows.push((text("name"), text("type"), text("url")));
        }
        bar.set_message(format!("Received {} structure definitions...", rows.len()));
    }
    bar.finish_and_clear();

    println!();
    println!("{}", output::structure_table(&rows));

    Ok(())
}

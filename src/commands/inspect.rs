//! Inspect one resource type: aggregate sampled instances into a frequency
//! tree and print it depth-limited.
//!
//! A fetch failure mid-run aborts the whole inspection; the partial tree is
//! discarded (partial statistics would mislead) and the error reports how
//! many instances had been folded before the failure.

use crate::aggregate::{self, Aggregation};
use crate::client::FhirClient;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::tree::MAX_DISTINCT_VALUES;
use crate::walk::{WalkOptions, MAX_VALUE_LEN};
use colored::Colorize;

pub struct InspectOpts {
    pub items: bool,
    pub level: u32,
    pub limit: Option<u64>,
    pub include_absent: bool,
    pub validate: bool,
}

pub async fn run(
    client: &FhirClient,
    resource_type: &str,
    opts: &InspectOpts,
    quiet: bool,
) -> CliResult<()> {
    if !quiet {
        println!(
            "Inspecting resource \"{resource_type}\" on FHIR server \"{}\"...",
            client.base_url()
        );
    }

    let total = client.count(resource_type).await?;
    if total == 0 {
        return Err(CliError::NoInstances {
            resource_type: resource_type.to_string(),
        });
    }

    let target = opts.limit.map_or(total, |limit| limit.min(total));
    if !quiet {
        println!("{total} resources of type \"{resource_type}\" on server. Fetching resources...");
    }

    let walk_opts = WalkOptions {
        inspect_values: opts.items,
        include_absent: opts.include_absent,
        require_resource_type: opts.validate,
    };

    let bar = output::progress_bar(target, "Receiving", quiet);
    let mut pages = client.search(resource_type);
    let result = aggregate::aggregate(&mut pages, opts.limit, walk_opts, |processed| {
        bar.set_position(processed)
    })
    .await;
    bar.finish_and_clear();

    let Aggregation {
        tree,
        processed,
        skipped,
    } = result?;

    if !quiet {
        if opts.limit.is_some_and(|limit| processed >= limit) {
            println!("Reached limit of {processed} resources to receive.");
        }
        println!(
            "{}",
            format!("Received {processed} of {total} items.").green()
        );
        if skipped > 0 {
            eprintln!(
                "{}",
                format!("Skipped {skipped} malformed instance(s).").yellow()
            );
        }
    }

    println!();
    // --level counts display levels, the renderer counts depth from 0.
    output::print_tree(resource_type, &tree, (opts.level - 1) as usize);

    if opts.items && !quiet {
        println!(
            "\nNotice: at most {MAX_DISTINCT_VALUES} distinct values are tracked per element \
             (further ones are summed as \"more\"), sorted by count. \
             Value strings are truncated to {MAX_VALUE_LEN} characters."
        );
    }

    Ok(())
}

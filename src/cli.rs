use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fhir-inspect",
    about = "Fetch, calculate and display meta information of a FHIR server",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Skip structural validation of fetched resources
    #[arg(long, global = true)]
    pub no_validation: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List resource types and their stored instance counts
    Resources {
        /// URL of the FHIR server
        url: String,

        /// Also output resource types with count zero (omitted otherwise)
        #[arg(long)]
        zero: bool,
    },

    /// Inspect one resource type: count its element paths as a tree view
    Inspect {
        /// URL of the FHIR server
        url: String,

        /// Resource type to inspect (e.g., "Patient")
        resource: String,

        /// Also collect the values seen at each element path
        #[arg(long)]
        items: bool,

        /// Maximum level up to which the hierarchy is displayed
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
        level: u32,

        /// Limit the number of resource instances to receive
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,

        /// Count explicit null values as element occurrences
        #[arg(long)]
        include_absent: bool,
    },

    /// List structure definitions on the server
    Structures {
        /// URL of the FHIR server
        url: String,
    },
}

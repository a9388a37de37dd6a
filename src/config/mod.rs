pub mod toml_config;

#[cfg(feature = "cli")]
mod cli {
    use crate::utils::error::Result;
    use crate::utils::validation::{self, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "geocode-csv")]
    #[command(about = "Geocode the addresses of a CSV file and write an augmented copy")]
    pub struct CliConfig {
        /// Source CSV file
        #[arg(short = 's', long = "source", value_name = "FILE")]
        pub source: String,

        /// TOML configuration file (field mapping, geocoder, rate limit, output)
        #[arg(short, long, value_name = "FILE")]
        pub config: Option<String>,

        /// Enable verbose output
        #[arg(short, long)]
        pub verbose: bool,

        /// Emit log lines as JSON
        #[arg(long)]
        pub json_logs: bool,

        /// Print the address of every row without calling the geocoder
        #[arg(long)]
        pub dry_run: bool,
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("source", &self.source)?;
            validation::validate_file_extension("source", &self.source, &["csv"])?;
            if let Some(config) = &self.config {
                validation::validate_path("config", config)?;
            }
            Ok(())
        }
    }

}

#[cfg(feature = "cli")]
pub use cli::CliConfig;

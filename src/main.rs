use clap::{CommandFactory, Parser};
use geocode_csv::core::geocode::extract_address;
use geocode_csv::core::pipeline::parse_input;
use geocode_csv::core::Storage;
use geocode_csv::utils::error::{ErrorCategory, ErrorSeverity, GeocodeError};
use geocode_csv::utils::{logger, validation::Validate};
use geocode_csv::{
    CliConfig, EtlEngine, FixedIntervalGate, GeocodeConfig, GeocodePipeline, GoogleGeocoder,
    LocalStorage, PipelineSettings,
};

/// Prints the error and exits. Everything except a bad row also gets the usage line.
fn exit_with(e: &GeocodeError) -> ! {
    tracing::error!(
        "❌ Geocoding failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    if e.category() != ErrorCategory::Extraction {
        eprintln!("\n{}", CliConfig::command().render_usage());
    }

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

fn load_config(cli: &CliConfig) -> geocode_csv::Result<GeocodeConfig> {
    cli.validate()?;
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            GeocodeConfig::from_file(path)?
        }
        None => GeocodeConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = load_config(&cli).unwrap_or_else(|e| exit_with(&e));
    let destination = config
        .output_path_for(&cli.source)
        .unwrap_or_else(|e| exit_with(&e));

    let storage = LocalStorage::default();

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests will be sent");
        if let Err(e) = perform_dry_run(&storage, &cli.source, &config).await {
            exit_with(&e);
        }
        return Ok(());
    }

    let geocoder =
        GoogleGeocoder::new(config.geocoder_settings()).unwrap_or_else(|e| exit_with(&e));
    let limiter = FixedIntervalGate::new(config.request_interval());
    let settings = PipelineSettings {
        source: cli.source.clone(),
        destination,
        mapping: config.input.clone(),
        overwrite: config.output.overwrite,
        show_progress: !cli.json_logs,
    };

    let pipeline = GeocodePipeline::new(storage, geocoder, limiter, settings);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            println!("{}", outcome.summary);
            println!("Wrote results to {}.", outcome.output_path);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

async fn perform_dry_run(
    storage: &LocalStorage,
    source: &str,
    config: &GeocodeConfig,
) -> geocode_csv::Result<()> {
    let table = parse_input(&storage.read_file(source).await?)?;

    println!("📋 Field mapping: {}", config.input.columns().join(", "));
    println!("📊 Rows: {}", table.rows.len());
    println!();

    for (index, row) in table.rows.iter().enumerate() {
        let address = extract_address(&config.input, index + 1, row)?;
        println!("{:>6}  {}", index + 1, address);
    }

    println!();
    println!(
        "✅ Dry run complete. {} requests would take at least {:?}.",
        table.rows.len(),
        config.request_interval() * table.rows.len().saturating_sub(1) as u32
    );
    Ok(())
}

use anyhow::Context;
use clap::Parser;
use cricket_etl::core::aggregate::Aggregator;
use cricket_etl::core::ConfigProvider;
use cricket_etl::domain::model::FielderColumns;
use cricket_etl::utils::{logger, validation::Validate};
use cricket_etl::{EtlEngine, LocalStorage, MatchPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Cricket delivery ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "cricket-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// List the match files that would be processed without processing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML");
            std::process::exit(1);
        }
    };

    logger::init_cli_logger(args.verbose || config.log_level() == Some("debug"));
    tracing::info!("Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        return perform_dry_run(&config).await;
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("System monitoring enabled");
    }

    let input = LocalStorage::new(config.input_dir().to_string());
    let output = LocalStorage::new(config.output_path().to_string());
    let pipeline = MatchPipeline::new(input, output, config);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            println!("✅ ETL process completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "ETL process failed: {} (category: {:?}, severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Input: {} (*.{})", config.input_dir(), config.file_extension());
    println!(
        "  Output: {}/{}",
        config.output_path(),
        config.output_filename()
    );
    println!("  On parse error: {:?}", config.parse_error_policy());
    println!("  Concurrency: {}", config.concurrency());

    match config.fielder_columns() {
        FielderColumns::Dynamic => println!("  Fielder columns: dynamic"),
        FielderColumns::Fixed(n) => println!("  Fielder columns: {}", n),
    }
    if let Some(length) = config.sequence_length() {
        println!("  Sequence windows: length {}", length);
    }
    if let Some(bundle) = config.bundle_filename() {
        println!("  Bundle: {}", bundle);
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let storage = LocalStorage::new(config.input_dir().to_string());
    let files = Aggregator::new(&storage)
        .with_extension(config.file_extension())
        .match_files()
        .await
        .with_context(|| format!("listing match files in {}", config.input_dir()))?;

    println!("🔍 {} match files would be processed:", files.len());
    for name in &files {
        println!("  {}", name);
    }

    Ok(())
}

use coin_consolidator::args::Args;
use coin_consolidator::config::Config;
use coin_consolidator::processor::Processor;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse_and_validate()?;

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::resolve(&args.dir, args.config.as_deref())?;
    tracing::debug!("Resolved config: {}", config.to_json()?);

    let processor = Processor::new(args.dir, config)
        .with_archive(!args.no_archive)
        .with_mirror(!args.no_mirror);

    processor.run()?;

    Ok(())
}

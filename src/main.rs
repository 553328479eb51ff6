use anyhow::Result;
use tracing::{info, warn};

use pwgenmon::classify::Classifier;
use pwgenmon::config::Config;
use pwgenmon::opt::Opt;
use pwgenmon::provider::{DumpFile, PwDump, SnapshotProvider};
use pwgenmon::trace;

fn main() -> Result<()> {
    let opt = Opt::parse();
    trace::initialize_logging(opt.verbose)?;

    let config_path = opt.config.clone().or_else(Config::default_path);
    let config = Config::try_new(config_path.as_deref(), &opt)?;

    let provider: Box<dyn SnapshotProvider> = match &opt.dump {
        Some(path) => Box::new(DumpFile::new(path)),
        None => Box::new(
            PwDump::new(&config.command, config.timeout)
                .args(&config.args)
                .with_remote(config.remote.as_deref()),
        ),
    };

    let outcome = provider.snapshot();
    if let Err(err) = &outcome {
        warn!("Failed to get graph snapshot: {err:#}");
    }

    let classification = Classifier::new(&opt.device)
        .with_volume_tolerance(config.volume_tolerance)
        .classify_outcome(&outcome);
    info!(
        status = ?classification.status,
        device = ?classification.device,
        "{}",
        classification.detail
    );

    println!("{}", config.renderer.render(&classification));

    Ok(())
}

use anyhow::{Context, bail};
use tracing::{info, warn};

use podcast_analytics::{
    config::Config,
    dataset::PodcastDataset,
    observability,
    registry::{AnalysisContext, CapabilityRegistry},
    report::write_report,
};

fn main() -> anyhow::Result<()> {
    observability::install_panic_hook();

    observability::init().context("failed to initialize tracing")?;
    let config = Config::from_env().context("failed to load configuration")?;
    let dataset = PodcastDataset::load(config.dataset_path())?;
    let registry = CapabilityRegistry::with_defaults();

    let selected: Vec<String> = if config.capabilities().is_empty() {
        registry.ids().map(str::to_string).collect()
    } else {
        config.capabilities().to_vec()
    };
    if let Some(unknown) = selected.iter().find(|id| !registry.contains(id)) {
        bail!(
            "unknown capability {unknown}, available: {}",
            registry.ids().collect::<Vec<_>>().join(", ")
        );
    }

    let context = AnalysisContext {
        dataset: &dataset,
        settings: config.analysis_settings(),
    };

    let mut failures = 0usize;
    for id in &selected {
        match registry
            .run(id, &context)
            .and_then(|report| write_report(config.output_dir(), id, &report))
        {
            Ok(path) => info!(capability = %id, path = %path.display(), "capability finished"),
            Err(error) => {
                failures += 1;
                warn!(capability = %id, error = ?error, "capability failed");
            }
        }
    }

    info!(
        capabilities = selected.len(),
        failures,
        output_dir = %config.output_dir().display(),
        "analytics run finished"
    );

    if failures > 0 {
        bail!("{failures} of {} capabilities failed", selected.len());
    }
    Ok(())
}

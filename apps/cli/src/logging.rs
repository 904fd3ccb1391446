use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "kcdb_export=info,kcdb=info",
        1 => "kcdb_export=debug,kcdb=debug",
        _ => "kcdb_export=trace,kcdb=trace,reqwest=debug",
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(verbose).into());

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

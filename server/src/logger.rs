use crate::Config;
use anyhow::Context;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub fn init(config: &Config) -> anyhow::Result<()> {
    let env_filter = env_filter(config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .try_init()
        .ok()
        .context("failed to install logger")
}

/// Build the log filter: `info` plus the configured directives.
fn env_filter(config: &Config) -> anyhow::Result<EnvFilter> {
    let mut env_filter = EnvFilter::default().add_directive(tracing::Level::INFO.into());

    for directive in config.logging.directives.iter() {
        let directive: Directive = directive
            .parse()
            .with_context(|| format!("failed to parse logging directive \"{directive}\""))?;
        env_filter = env_filter.add_directive(directive);
    }

    Ok(env_filter)
}

//! Eloader - discovers units below the configured roots and wires them up

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use eloader_config::{ConfigLoader, LoaderConfig, RootConfig, RootRole};
use eloader_di::{Container, LoadError};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

mod units;

#[derive(Parser)]
#[command(name = "eloader")]
#[command(about = "Eloader - name based dependency injection for unit directories")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop at the first unit that fails
    #[arg(long)]
    fail_fast: bool,

    /// Route directory, may be repeated
    #[arg(long = "root")]
    roots: Vec<PathBuf>,

    /// Service directory, may be repeated
    #[arg(long = "service")]
    services: Vec<PathBuf>,

    /// Search the directories given on the command line recursively
    #[arg(short, long)]
    recursive: bool,
}

impl Cli {
    /// Command line roots and flags are added on top of the loaded configuration
    fn apply(self, config: &mut LoaderConfig) {
        config.fail_fast |= self.fail_fast;
        let services = self.services.into_iter().map(|path| (path, RootRole::Service));
        let routes = self.roots.into_iter().map(|path| (path, RootRole::Route));
        for (path, role) in services.chain(routes) {
            config.roots.push(RootConfig {
                path,
                recursive: self.recursive,
                role,
            });
        }
    }
}

/// Narrows the log filter once the configured level is known
type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Installs the subscriber before the configuration is read, so its
/// warnings are not lost
fn init_logging() -> FilterHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);
    Registry::default().with(filter).with(fmt::layer()).init();
    handle
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logging = init_logging();

    match run(cli, &logging) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, logging: &FilterHandle) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    let mut config = loader.load().context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    // RUST_LOG wins over the configured level
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        let filter = EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("Invalid log level '{}'", config.log_level))?;
        logging.reload(filter)?;
    }

    let mut container = Container::builder()
        .external(units::external())
        .loader(units::catalog())
        .build();
    config.register_into(&mut container)?;

    let directories = config.directories();
    let mut fallback = config.fallback();
    match container.run(&directories, fallback.as_mut()) {
        Ok(report) => {
            tracing::info!(
                "Done: {} services, {} routes, {} failed",
                report.registered,
                report.invoked,
                report.failed.len()
            );
            tracing::debug!("{container:?}");
            Ok(())
        }
        Err(error @ LoadError::Aborted { .. }) => Err(error).context("Load aborted"),
        Err(error) => Err(error.into()),
    }
}

//! Wikidatable bot: fills DATASLOT/REFSLOT markers in wiki table templates
//! from Wikidata and writes the resulting pages.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikidatable::{build_engine, FsPageStore, Runner};
use wikidatable_core::{BotConfig, Strategy};

#[derive(Parser)]
#[command(
    name = "wikidatable",
    version,
    about = "Keep wiki tables in sync with Wikidata"
)]
struct Cli {
    /// Bot configuration file
    #[arg(short, long, default_value = "wikidatable.toml")]
    config: PathBuf,

    /// Directory holding the wiki pages, one file per title
    #[arg(short, long, default_value = "pages")]
    pages: PathBuf,

    /// Override the lookup strategy (snapshot or query)
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Resolve everything but write nothing
    #[arg(long)]
    dry_run: bool,

    /// Also write daily-rotated logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "wikidatable.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wikidatable=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_deref());

    let mut config = BotConfig::load(&cli.config);
    if let Some(strategy) = cli.strategy {
        config.wikidata.strategy = strategy;
    }

    if cli.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    let engine = build_engine(&config)?;
    let store = Arc::new(FsPageStore::new(&cli.pages));
    let runner = Runner::new(store, engine, &config).with_dry_run(cli.dry_run);

    let report = runner.run().await?;
    if cli.dry_run {
        for page in &report.processed {
            println!("== {} ==\n{}", page.output_title, page.body);
        }
    }
    Ok(())
}

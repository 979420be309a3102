use std::process;

use clap::Parser;
use log::{error, info};

use daybook::{App, Cli, Config, EntryStore, FileMirror, FileStore, Result};

fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.mirror_dir {
        config.mirror_dir = dir;
    }

    info!(
        "Opening entry store: data_dir={}, mirror_dir={}",
        config.data_dir.display(),
        config.mirror_dir.display()
    );

    let primary = FileStore::new(&config.data_dir)?;
    let mirror = FileMirror::new(&config.mirror_dir)?;
    let store = EntryStore::new(primary, mirror);

    let app = App::new(store, config);
    app.run(cli.command).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

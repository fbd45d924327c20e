use std::{process::ExitCode, sync::Arc};

use locibot_core::{config::Config, store::SqliteStore};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = locibot_core::logging::init("locibot") {
        eprintln!("{e}");
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "bot failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), locibot_core::Error> {
    let cfg = Arc::new(Config::load()?);
    cfg.ensure_data_dir()?;

    tracing::info!(db_path = %cfg.db_path.display(), "LociOne bot starting");
    let store = Arc::new(SqliteStore::open(&cfg.db_path)?);

    locibot_telegram::router::run_polling(cfg, store)
        .await
        .map_err(|e| locibot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}

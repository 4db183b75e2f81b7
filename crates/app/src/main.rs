use std::io::{self, Write};

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projhis_app::config::AppConfig;
use projhis_app::controller::{FormController, SubmitOutcome};
use projhis_app::events::FormEvent;
use projhis_app::form::EntryForm;
use projhis_app::prompt::{confirm, fill_form};
use projhis_db::{DbConfig, PgConnector, ProjectStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projhis_app=info,projhis_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // --- Configuration ---
    let db_config = DbConfig::from_env().context("Invalid database configuration")?;
    let app_config = AppConfig::from_env();
    tracing::info!(
        host = %db_config.host,
        port = db_config.port,
        database = %db_config.database,
        save_dir = %app_config.save_dir.display(),
        "Loaded configuration"
    );

    // --- Database health check ---
    check_database(&db_config).await;

    // --- Controller ---
    let controller = FormController::new(PgConnector::new(&db_config), &app_config);
    let listener = tokio::spawn(log_saved_events(controller.subscribe()));

    // --- Entry loop ---
    let mut form = EntryForm::new();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    loop {
        if !fill_form(&mut form, &mut input, &mut out)? {
            break;
        }

        let outcome = controller.submit(&mut form).await;
        writeln!(out, "{}", outcome.message())?;

        let again = match outcome {
            SubmitOutcome::Saved { .. } => confirm("Enter another project?", &mut input, &mut out)?,
            SubmitOutcome::Invalid(_) => true,
            SubmitOutcome::ConnectionFailed(_) | SubmitOutcome::PersistenceFailed(_) => {
                confirm("Try again?", &mut input, &mut out)?
            }
        };
        if !again {
            break;
        }
    }

    drop(controller);
    listener.await.ok();
    Ok(())
}

/// Open, ping, and close a connection so a bad setup is reported up front.
/// Entry still works offline; every submission connects on its own.
async fn check_database(config: &DbConfig) {
    let result = async {
        let mut store = ProjectStore::connect(config).await?;
        store.ping().await?;
        store.close().await
    }
    .await;

    match result {
        Ok(()) => tracing::info!("Database health check passed"),
        Err(e) => tracing::warn!(error = %e, "Database health check failed"),
    }
}

async fn log_saved_events(mut rx: tokio::sync::broadcast::Receiver<FormEvent>) {
    loop {
        match rx.recv().await {
            Ok(FormEvent::Saved { id, name, timestamp }) => {
                tracing::info!(id, name = %name, %timestamp, "Saved event received");
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Saved-event listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

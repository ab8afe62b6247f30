//! Serve command: HTTP trigger plus periodic scheduler, in the foreground.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bookingsync_engine::{Scheduler, SharedSyncService, SyncService};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::CliResult;
use crate::http::router;
use crate::setup::build_reconciler;

/// Runs until SIGINT or SIGTERM.
pub async fn serve(
    config: &AppConfig,
    bind: Option<SocketAddr>,
    interval: Option<u64>,
) -> CliResult<()> {
    config.validate()?;

    let mut settings = config.server.clone();
    if let Some(bind) = bind {
        settings.bind = bind;
    }
    if let Some(interval) = interval {
        settings.interval_secs = interval;
    }

    let service: SharedSyncService = Arc::new(SyncService::new(build_reconciler(config, false)?));

    let scheduler = settings.scheduler().map(|scheduler_config| {
        let scheduler = Scheduler::new(scheduler_config);
        let handle = scheduler.handle();
        let pass_service = service.clone();
        let task = tokio::spawn(scheduler.run(move || {
            let service = pass_service.clone();
            async move { service.run_pass().await }
        }));
        (handle, task)
    });
    if scheduler.is_none() {
        info!("scheduler disabled, passes run only on POST /sync");
    }

    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    info!(addr = %settings.bind, "trigger server listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down");
    if let Some((handle, task)) = scheduler {
        if let Err(e) = handle.stop().await {
            warn!(error = %e, "failed to send stop command to scheduler");
        }
        // A pass in flight gets a moment to finish.
        let _ = tokio::time::timeout(Duration::from_secs(30), task).await;
    }

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}

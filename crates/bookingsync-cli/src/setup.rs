//! Builds a [`Reconciler`] from configuration.

use bookingsync_engine::Reconciler;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Wires the calendar provider and source described by `config`.
#[cfg(feature = "google")]
pub fn build_reconciler(config: &AppConfig, dry_run: bool) -> CliResult<Reconciler> {
    use std::sync::Arc;

    use bookingsync_providers::google::{
        CALENDAR_SCOPE, DATASTORE_SCOPE, GoogleCalendarClient, ServiceAccountTokenSource,
        StaticToken, TokenSource,
    };
    use bookingsync_providers::{SnapshotSource, SourceReader};
    use tracing::info;

    use crate::config::{GoogleCredential, SourceSettings};

    let source_settings = config
        .source
        .as_ref()
        .ok_or_else(|| CliError::Config("no [source] section configured".to_string()))?;
    let google = config.google.clone().unwrap_or_default();
    let provider_config = google.to_provider_config()?;

    let (tokens, key_project): (Arc<dyn TokenSource>, Option<String>) =
        match google.resolve_credential()? {
            GoogleCredential::AccessToken(token) => {
                let tokens: Arc<dyn TokenSource> = Arc::new(StaticToken::new(token));
                (tokens, None)
            }
            GoogleCredential::ServiceAccount(key) => {
                let project = key.project_id.clone();
                let scopes = vec![CALENDAR_SCOPE.to_string(), DATASTORE_SCOPE.to_string()];
                let source = ServiceAccountTokenSource::new(&key, scopes)?;
                info!(client_email = source.client_email(), "using service account");
                let tokens: Arc<dyn TokenSource> = Arc::new(source);
                (tokens, project)
            }
        };

    let calendar = GoogleCalendarClient::new(provider_config.clone(), tokens.clone())?;

    let source: Arc<dyn SourceReader> = match source_settings {
        SourceSettings::Snapshot { path } => Arc::new(SnapshotSource::new(path)),
        SourceSettings::Firestore {
            project_id,
            database,
            units_collection,
            bookings_collection,
        } => {
            use bookingsync_providers::firestore::{FirestoreLayout, FirestoreSource};

            let project_id = project_id.clone().or(key_project).ok_or_else(|| {
                CliError::Config(
                    "source.project_id is required when the credential names no project"
                        .to_string(),
                )
            })?;
            let defaults = FirestoreLayout::default();
            let layout = FirestoreLayout {
                units_collection: units_collection
                    .clone()
                    .unwrap_or(defaults.units_collection),
                bookings_collection: bookings_collection
                    .clone()
                    .unwrap_or(defaults.bookings_collection),
                unit_field: defaults.unit_field,
                remote_event_field: defaults.remote_event_field,
            };

            let mut source = FirestoreSource::new(provider_config, tokens, project_id)?
                .with_layout(layout);
            if let Some(database) = database {
                source = source.with_database(database);
            }
            Arc::new(source)
        }
    };

    info!(source = source.name(), "reconciler ready");
    Ok(Reconciler::new(
        Arc::new(calendar),
        source,
        config.sync.to_options(dry_run),
    ))
}

/// Without Google support there is no calendar to write to.
#[cfg(not(feature = "google"))]
pub fn build_reconciler(_config: &AppConfig, _dry_run: bool) -> CliResult<Reconciler> {
    Err(CliError::Config(
        "built without the `google` feature; no calendar provider is available".to_string(),
    ))
}

//! Firestore REST source.

use std::collections::BTreeMap;
use std::sync::Arc;

use bookingsync_core::{Booking, BookingStatus, Unit};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::value::{Document, Fields, Value};
use crate::error::{ProviderError, ProviderResult};
use crate::google::{GoogleConfig, TokenSource, http};
use crate::provider::BoxFuture;
use crate::source::SourceReader;

const PROVIDER: &str = "firestore";

/// Collection and field names of the source documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreLayout {
    pub units_collection: String,
    pub bookings_collection: String,
    /// Booking field referencing the unit document id.
    pub unit_field: String,
    /// Booking field receiving the remote event id on write-back.
    pub remote_event_field: String,
}

impl Default for FirestoreLayout {
    fn default() -> Self {
        Self {
            units_collection: "units".to_string(),
            bookings_collection: "bookings".to_string(),
            unit_field: "unitId".to_string(),
            remote_event_field: "remoteEventId".to_string(),
        }
    }
}

/// Reads units and bookings from Cloud Firestore.
pub struct FirestoreSource {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    config: GoogleConfig,
    project_id: String,
    database: String,
    layout: FirestoreLayout,
}

impl std::fmt::Debug for FirestoreSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreSource")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

/// One element of the runQuery response stream.
#[derive(Debug, Deserialize)]
struct QueryResult {
    document: Option<Document>,
}

#[derive(Debug, Serialize)]
struct PatchBody {
    fields: BTreeMap<String, Value>,
}

impl FirestoreSource {
    /// Creates a source for `project_id` using the `(default)` database.
    pub fn new(
        config: GoogleConfig,
        tokens: Arc<dyn TokenSource>,
        project_id: impl Into<String>,
    ) -> ProviderResult<Self> {
        let http = config.http_client()?;
        Ok(Self {
            http,
            tokens,
            config,
            project_id: project_id.into(),
            database: "(default)".to_string(),
            layout: FirestoreLayout::default(),
        })
    }

    /// Builder: use a named database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Builder: override collection and field names.
    pub fn with_layout(mut self, layout: FirestoreLayout) -> Self {
        self.layout = layout;
        self
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.config.firestore_api_base, self.project_id, self.database
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ProviderResult<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| http::transport_error(PROVIDER, e))
    }

    fn unit_from(&self, doc: &Document) -> Unit {
        let fields = &doc.fields;
        Unit {
            id: doc.id().to_string(),
            name: fields.text("name").unwrap_or_default(),
            calendar_id: fields.text("calendarId"),
            color_id: fields.text("colorId"),
        }
    }

    fn booking_from(&self, doc: &Document) -> Booking {
        let fields: &Fields = &doc.fields;
        Booking {
            id: doc.id().to_string(),
            unit_id: fields.text(&self.layout.unit_field).unwrap_or_default(),
            checkin_date: fields.date("checkinDate"),
            checkout_date: fields.date("checkoutDate"),
            guest_first_name: fields.text("guestFirstName"),
            guest_last_name: fields.text("guestLastName"),
            status: fields.text("status").map(BookingStatus::from).unwrap_or_default(),
            remote_event_id: fields.text(&self.layout.remote_event_field),
        }
    }
}

impl SourceReader for FirestoreSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn list_units(&self) -> BoxFuture<'_, ProviderResult<Vec<Unit>>> {
        Box::pin(async move {
            let url = format!("{}/{}", self.documents_url(), self.layout.units_collection);
            let mut units = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let mut request = self
                    .http
                    .get(&url)
                    .query(&[("pageSize", self.config.page_size.to_string())]);
                if let Some(ref token) = page_token {
                    request = request.query(&[("pageToken", token)]);
                }
                let page: ListDocumentsResponse = http::read_json(PROVIDER, self.send(request).await?).await?;
                units.extend(page.documents.iter().map(|doc| self.unit_from(doc)));

                match page.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }

            debug!(count = units.len(), "listed units");
            Ok(units)
        })
    }

    fn list_bookings<'a>(&'a self, unit_id: &'a str) -> BoxFuture<'a, ProviderResult<Vec<Booking>>> {
        Box::pin(async move {
            let body = json!({
                "structuredQuery": {
                    "from": [{"collectionId": self.layout.bookings_collection}],
                    "where": {
                        "fieldFilter": {
                            "field": {"fieldPath": self.layout.unit_field},
                            "op": "EQUAL",
                            "value": {"stringValue": unit_id}
                        }
                    }
                }
            });
            let request = self
                .http
                .post(format!("{}:runQuery", self.documents_url()))
                .json(&body);
            let results: Vec<QueryResult> = http::read_json(PROVIDER, self.send(request).await?).await?;

            let bookings: Vec<Booking> = results
                .iter()
                .filter_map(|r| r.document.as_ref())
                .map(|doc| self.booking_from(doc))
                .collect();
            debug!(unit_id, count = bookings.len(), "listed bookings");
            Ok(bookings)
        })
    }

    fn record_remote_event_id<'a>(
        &'a self,
        booking: &'a Booking,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            if booking.id.trim().is_empty() {
                warn!("not recording remote event id for a booking without id");
                return Ok(());
            }
            let url = format!(
                "{}/{}/{}",
                self.documents_url(),
                self.layout.bookings_collection,
                urlencoding::encode(&booking.id)
            );
            let body = PatchBody {
                fields: BTreeMap::from([(
                    self.layout.remote_event_field.clone(),
                    Value::string(event_id),
                )]),
            };
            // The mask limits the write to one field; the precondition keeps a
            // booking deleted mid-pass from being recreated.
            let request = self
                .http
                .patch(url)
                .query(&[
                    ("updateMask.fieldPaths", self.layout.remote_event_field.as_str()),
                    ("currentDocument.exists", "true"),
                ])
                .json(&body);
            http::read_empty(PROVIDER, self.send(request).await?)
                .await
                .map_err(|e| match e.code() {
                    crate::ProviderErrorCode::NotFound => {
                        ProviderError::not_found(format!("booking {} no longer exists", booking.id))
                            .with_provider(PROVIDER)
                    }
                    _ => e,
                })
        })
    }
}

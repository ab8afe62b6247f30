//! Google Calendar API client.
//!
//! Maps [`EventContent`] onto Calendar v3 all-day events. The booking and unit
//! identity tags are stored as private extended properties, which the API can
//! filter on server-side (`privateExtendedProperty=bookingId=...`).

use std::collections::BTreeMap;
use std::sync::Arc;

use bookingsync_core::{DateSpan, EventContent};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::auth::TokenSource;
use super::config::GoogleConfig;
use super::http;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider, EventQuery};
use crate::remote_event::RemoteEvent;

const PROVIDER: &str = "google";

/// Private extended property holding the booking id.
pub const BOOKING_TAG_KEY: &str = "bookingId";

/// Private extended property holding the unit id.
pub const UNIT_TAG_KEY: &str = "unitId";

/// Google Calendar v3 client.
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    config: GoogleConfig,
}

impl std::fmt::Debug for GoogleCalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCalendarClient")
            .field("api_base", &self.config.calendar_api_base)
            .finish_non_exhaustive()
    }
}

impl GoogleCalendarClient {
    /// Creates a client authenticating with `tokens`.
    pub fn new(config: GoogleConfig, tokens: Arc<dyn TokenSource>) -> ProviderResult<Self> {
        let http = config.http_client()?;
        Ok(Self::with_http_client(config, tokens, http))
    }

    /// Creates a client on an existing HTTP client.
    pub fn with_http_client(
        config: GoogleConfig,
        tokens: Arc<dyn TokenSource>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            http,
            tokens,
            config,
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.calendar_api_base,
            urlencoding::encode(calendar_id)
        )
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/{}",
            self.events_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> ProviderResult<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| http::transport_error(PROVIDER, e))
    }

    async fn list_page(
        &self,
        calendar_id: &str,
        query: &EventQuery,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let mut request = self.http.get(self.events_url(calendar_id)).query(&[
            ("showDeleted", "false".to_string()),
            ("maxResults", self.config.page_size.to_string()),
        ]);

        if let Some(ref tag) = query.booking_tag {
            request = request.query(&[("privateExtendedProperty", format!("{BOOKING_TAG_KEY}={tag}"))]);
        }
        if let Some(ref tag) = query.unit_tag {
            request = request.query(&[("privateExtendedProperty", format!("{UNIT_TAG_KEY}={tag}"))]);
        }
        if let Some(window) = query.window {
            request = request.query(&[
                ("timeMin", midnight_utc(window.start())),
                ("timeMax", midnight_utc(window.end())),
            ]);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.authorized(request).await?;
        http::read_json(PROVIDER, response).await
    }
}

impl CalendarProvider for GoogleCalendarClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        query: &'a EventQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<RemoteEvent>>> {
        Box::pin(async move {
            let mut events = Vec::new();
            let mut page_token: Option<String> = None;

            loop {
                let page = self.list_page(calendar_id, query, page_token.as_deref()).await?;
                events.extend(
                    page.items
                        .into_iter()
                        .filter_map(ApiEvent::into_remote)
                        // timeMin/timeMax compare instants; all-day overlap is checked here
                        .filter(|e| query.matches(e)),
                );

                match page.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }

            debug!(calendar_id, count = events.len(), "listed events");
            Ok(events)
        })
    }

    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move {
            let response = self
                .authorized(self.http.get(self.event_url(calendar_id, event_id)))
                .await?;
            let event: ApiEvent = http::read_json(PROVIDER, response).await?;
            // Deleted events stay readable by id with status "cancelled".
            event.into_remote().ok_or_else(|| {
                ProviderError::not_found(format!("event {event_id} is deleted")).with_provider(PROVIDER)
            })
        })
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        content: &'a EventContent,
        event_id: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move {
            let body = EventBody::new(content, event_id);
            let response = self
                .authorized(self.http.post(self.events_url(calendar_id)).json(&body))
                .await?;
            let event: ApiEvent = http::read_json(PROVIDER, response).await?;
            stored(event)
        })
    }

    fn update_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        content: &'a EventContent,
    ) -> BoxFuture<'a, ProviderResult<RemoteEvent>> {
        Box::pin(async move {
            let body = EventBody::new(content, None);
            let response = self
                .authorized(self.http.put(self.event_url(calendar_id, event_id)).json(&body))
                .await?;
            let event: ApiEvent = http::read_json(PROVIDER, response).await?;
            stored(event)
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            let response = self
                .authorized(self.http.delete(self.event_url(calendar_id, event_id)))
                .await?;
            http::read_empty(PROVIDER, response).await
        })
    }
}

fn midnight_utc(date: NaiveDate) -> String {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().to_rfc3339())
        .unwrap_or_default()
}

/// Checks the event a write answered with.
fn stored(event: ApiEvent) -> ProviderResult<RemoteEvent> {
    if event.status.as_deref() == Some("cancelled") {
        let id = event.id.as_deref().unwrap_or_default();
        return Err(ProviderError::invalid_response(format!(
            "event {id} is still cancelled after the write"
        ))
        .with_provider(PROVIDER));
    }
    event.into_remote().ok_or_else(|| {
        ProviderError::invalid_response("write returned an event without an id").with_provider(PROVIDER)
    })
}

/// Request body for insert and update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    /// Always `confirmed`, so writing to a deleted event's id restores it.
    status: &'static str,
    summary: &'a str,
    description: &'a str,
    start: AllDay,
    end: AllDay,
    color_id: &'a str,
    extended_properties: BodyProperties<'a>,
}

#[derive(Debug, Serialize)]
struct AllDay {
    date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct BodyProperties<'a> {
    private: BTreeMap<&'static str, &'a str>,
}

impl<'a> EventBody<'a> {
    fn new(content: &'a EventContent, id: Option<&'a str>) -> Self {
        Self {
            id,
            status: "confirmed",
            summary: &content.summary,
            description: &content.description,
            start: AllDay {
                date: content.span.start(),
            },
            end: AllDay {
                date: content.span.end(),
            },
            color_id: &content.color_id,
            extended_properties: BodyProperties {
                private: BTreeMap::from([
                    (BOOKING_TAG_KEY, content.booking_tag.as_str()),
                    (UNIT_TAG_KEY, content.unit_tag.as_str()),
                ]),
            },
        }
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
    color_id: Option<String>,
    created: Option<String>,
    extended_properties: Option<ApiExtendedProperties>,
}

/// Start or end of an event; all-day events carry `date`, timed ones `dateTime`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiExtendedProperties {
    #[serde(default)]
    private: BTreeMap<String, String>,
}

impl ApiEvent {
    /// Converts to a [`RemoteEvent`], dropping deleted or id-less events.
    fn into_remote(self) -> Option<RemoteEvent> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }
        let id = self.id?;

        let span = match (parse_date(&self.start), parse_date(&self.end)) {
            (Some(start), Some(end)) => DateSpan::new(start, end).ok(),
            _ => None,
        };
        let created = self.created.as_deref().and_then(|c| {
            DateTime::parse_from_rfc3339(c)
                .map_err(|e| warn!(event_id = %id, "unparsable created timestamp: {}", e))
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        });
        let mut private = self.extended_properties.unwrap_or_default().private;

        Some(RemoteEvent {
            summary: self.summary.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            span,
            color_id: self.color_id,
            booking_tag: private.remove(BOOKING_TAG_KEY),
            unit_tag: private.remove(UNIT_TAG_KEY),
            created,
            id,
        })
    }
}

fn parse_date(time: &Option<ApiEventTime>) -> Option<NaiveDate> {
    let date = time.as_ref()?.date.as_deref()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

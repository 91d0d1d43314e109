//! HTTP client for the interpretation service

use async_trait::async_trait;
use ops_desk_types::{HistoryEntry, HistoryQuery, InterpretRequest, InterpretResponse, QuickAction};
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use super::{CommandService, Result};
use crate::config::DeskConfig;
use crate::error::CommandError;
use crate::session::SessionContext;

const INTERPRET_PATH: &str = "commands/interpret";
const QUICK_ACTIONS_PATH: &str = "commands/quick-actions";
const HISTORY_PATH: &str = "commands/history";

const CORRELATION_HEADER: &str = "X-Correlation-Id";
const STAFF_HEADER: &str = "X-Staff-Id";

/// Longest server error body kept on a `CommandError::Server`
const MAX_ERROR_BODY: usize = 200;

pub struct HttpCommandService {
    http: Client,
    base_url: Url,
    session: SessionContext,
    /// Replaced wholesale on first successful fetch, never patched
    quick_actions: RwLock<Option<Arc<[QuickAction]>>>,
}

impl HttpCommandService {
    pub fn new(config: &DeskConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session: config.session.clone(),
            quick_actions: RwLock::new(None),
        })
    }

    /// Drop the quick-action cache (e.g. after the session changes hands).
    pub async fn clear_quick_actions_cache(&self) {
        *self.quick_actions.write().await = None;
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| CommandError::network(format!("invalid endpoint {}: {}", path, e)))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match self.session.auth_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        match self.session.staff_id() {
            Some(staff_id) => builder.header(STAFF_HEADER, staff_id),
            None => builder,
        }
    }

    /// Send a request and return the body of a 2xx response.
    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Vec<u8>> {
        let response = self
            .authorize(builder)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(request = what, error = %e, "command service unreachable");
                CommandError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(request = what, status = status.as_u16(), "command service error");
            return Err(CommandError::Server {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let bytes = response.bytes().await.map_err(CommandError::from)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl CommandService for HttpCommandService {
    async fn interpret(
        &self,
        correlation_id: Uuid,
        request: &InterpretRequest,
    ) -> Result<InterpretResponse> {
        let url = self.endpoint(INTERPRET_PATH)?;
        tracing::debug!(
            %correlation_id,
            context_fields = request.context.len(),
            "interpreting command"
        );

        let builder = self
            .http
            .post(url)
            .header(CORRELATION_HEADER, correlation_id.to_string())
            .json(request);
        let body = self.send(builder, "interpret").await?;

        InterpretResponse::from_slice(&body).map_err(|e| {
            tracing::warn!(%correlation_id, error = %e, "malformed interpret response");
            CommandError::from(e)
        })
    }

    async fn list_quick_actions(&self) -> Result<Arc<[QuickAction]>> {
        if let Some(cached) = self.quick_actions.read().await.as_ref() {
            tracing::debug!(count = cached.len(), "quick actions served from cache");
            return Ok(Arc::clone(cached));
        }

        let url = self.endpoint(QUICK_ACTIONS_PATH)?;
        let body = self.send(self.http.get(url), "quick_actions").await?;
        let actions: Vec<QuickAction> = serde_json::from_slice(&body)
            .map_err(|e| CommandError::MalformedResponse(format!("invalid quick actions: {}", e)))?;

        let actions: Arc<[QuickAction]> = actions.into();
        *self.quick_actions.write().await = Some(Arc::clone(&actions));
        tracing::info!(count = actions.len(), "quick actions loaded");
        Ok(actions)
    }

    async fn get_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
        let url = self.endpoint(HISTORY_PATH)?;
        let builder = self.http.get(url).query(&query.query_pairs());
        let body = self.send(builder, "history").await?;

        let raw: Vec<serde_json::Value> = serde_json::from_slice(&body)
            .map_err(|e| CommandError::MalformedResponse(format!("invalid history: {}", e)))?;

        // One unreadable entry must not hide the rest of the page.
        let entries: Vec<HistoryEntry> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<HistoryEntry>(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable history entry");
                    None
                }
            })
            .collect();
        tracing::debug!(
            count = entries.len(),
            agent = ?query.agent,
            status = ?query.status,
            "history fetched"
        );
        Ok(entries)
    }
}

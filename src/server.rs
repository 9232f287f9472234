//! Chat web UI: a single page talking to a JSON API.
//!
//! - `GET  /`               — chat page
//! - `POST /api/chat`       — run one agent turn (history is client-held)
//! - `GET  /api/catalogs`   — cached catalog listing
//! - `GET  /api/principals` — cached user/group listing
//! - `POST /api/refresh`    — drop the cached listings
//! - `GET  /healthz`        — liveness

use crate::agent;
use crate::cache::TtlCell;
use crate::config::{AgentConfig, Config};
use crate::llm::{ContentBlock, ConversationMessage, LlmClient, Role};
use crate::workspace::{CatalogInfo, GroupInfo, UserInfo, WorkspaceClient};
use askama::Template;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info};

pub struct AppState {
    llm: LlmClient,
    client: WorkspaceClient,
    agent: AgentConfig,
    catalogs: Mutex<TtlCell<Vec<CatalogInfo>>>,
    principals: Mutex<TtlCell<PrincipalsResponse>>,
}

#[derive(Template)]
#[template(path = "chat.html")]
struct ChatPage {
    host: String,
    model: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Prior turns, kept by the browser and replayed per request.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub turns: u32,
    pub tool_calls: u32,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalsResponse {
    pub users: Vec<UserInfo>,
    pub groups: Vec<GroupInfo>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .route("/api/catalogs", get(catalogs))
        .route("/api/principals", get(principals))
        .route("/api/refresh", post(refresh))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

pub async fn serve(config: Config, llm: LlmClient) -> anyhow::Result<()> {
    let client = WorkspaceClient::new(&config.workspace)?;
    let ttl = Duration::from_secs(config.server.cache_ttl_secs);

    let state = Arc::new(AppState {
        llm,
        client,
        agent: config.agent.clone(),
        catalogs: Mutex::new(TtlCell::new(ttl)),
        principals: Mutex::new(TtlCell::new(ttl)),
    });

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "chat UI listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    let page = ChatPage {
        host: state.client.host().to_string(),
        model: state.llm.model().to_string(),
    };
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "chat page render failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "template render failed")
        }
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    let mut history = replay_history(&req.history);
    match agent::run_turn(
        &state.llm,
        &state.client,
        &state.agent,
        &mut history,
        &req.message,
    )
    .await
    {
        Ok((reply, stats)) => Json(ChatResponse {
            reply,
            turns: stats.turns,
            tool_calls: stats.tool_calls,
            cost_usd: stats.total_cost_usd,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "chat turn failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

/// Rebuild the conversation from the browser's transcript. Only the text of
/// prior turns is replayed; tool traffic is not round-tripped to the client.
fn replay_history(entries: &[HistoryEntry]) -> Vec<ConversationMessage> {
    entries
        .iter()
        .filter(|e| !e.text.is_empty())
        .map(|e| ConversationMessage {
            role: if e.role == "assistant" {
                Role::Assistant
            } else {
                Role::User
            },
            content: vec![ContentBlock::Text {
                text: e.text.clone(),
            }],
        })
        .collect()
}

async fn catalogs(State(state): State<Arc<AppState>>) -> Response {
    let mut cache = state.catalogs.lock().await;
    if let Some(cached) = cache.get() {
        return Json(cached).into_response();
    }
    match state.client.list_catalogs().await {
        Ok(list) => {
            cache.put(list.clone());
            Json(list).into_response()
        }
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    }
}

async fn principals(State(state): State<Arc<AppState>>) -> Response {
    let mut cache = state.principals.lock().await;
    if let Some(cached) = cache.get() {
        return Json(cached).into_response();
    }
    let users = match state.client.list_users().await {
        Ok(u) => u,
        Err(e) => return error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    };
    let groups = match state.client.list_groups().await {
        Ok(g) => g,
        Err(e) => return error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    };
    let resp = PrincipalsResponse { users, groups };
    cache.put(resp.clone());
    Json(resp).into_response()
}

/// Drop the cached listings so the next fetch hits the workspace.
async fn refresh(State(state): State<Arc<AppState>>) -> Response {
    state.catalogs.lock().await.invalidate();
    state.principals.lock().await.invalidate();
    info!("cached listings dropped");
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_history_maps_roles() {
        let entries = vec![
            HistoryEntry {
                role: "user".into(),
                text: "list catalogs".into(),
            },
            HistoryEntry {
                role: "assistant".into(),
                text: "main, sales".into(),
            },
            HistoryEntry {
                role: "assistant".into(),
                text: String::new(),
            },
        ];
        let history = replay_history(&entries);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn refresh_drops_cached_listings() {
        let llm = LlmClient::new(
            crate::llm::Provider::OpenAi,
            "test-key".into(),
            "gpt-4.1-nano".into(),
            256,
            None,
        )
        .unwrap();
        let client = WorkspaceClient::new(&crate::config::WorkspaceConfig {
            host: "http://127.0.0.1:1".into(),
            token: "dapi-test".into(),
        })
        .unwrap();
        let state = Arc::new(AppState {
            llm,
            client,
            agent: AgentConfig::default(),
            catalogs: Mutex::new(TtlCell::new(Duration::from_secs(600))),
            principals: Mutex::new(TtlCell::new(Duration::from_secs(600))),
        });

        state.catalogs.lock().await.put(Vec::new());
        state.principals.lock().await.put(PrincipalsResponse {
            users: Vec::new(),
            groups: Vec::new(),
        });

        let resp = refresh(State(state.clone())).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(state.catalogs.lock().await.get().is_none());
        assert!(state.principals.lock().await.get().is_none());
    }

    #[test]
    fn chat_page_renders() {
        let page = ChatPage {
            host: "https://dbc-123.cloud.databricks.com".into(),
            model: "gpt-4.1-nano".into(),
        };
        let html = page.render().unwrap();
        assert!(html.contains("dbc-123.cloud.databricks.com"));
        assert!(html.contains("gpt-4.1-nano"));
    }
}

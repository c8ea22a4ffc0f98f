//! Gateway HTTP server: status page, Twilio webhook, outbound send.

use crate::activity::{ActivityLog, Exchange};
use crate::channels::{twiml_reply, WhatsAppChannel};
use crate::config::{
    self, resolve_account_sid, resolve_anthropic_api_key, resolve_auth_token,
    resolve_from_address, Config,
};
use crate::enhancer::Enhancer;
use crate::llm::ClaudeClient;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// How many exchanges the status page shows.
const STATUS_PAGE_WINDOW: usize = 10;

/// Shared state for the gateway (config, enhancer, channel, activity log).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub enhancer: Enhancer,
    pub whatsapp: WhatsAppChannel,
    pub activity: ActivityLog,
}

impl AppState {
    /// Build state from config: resolve credentials (env over file) and wire
    /// the Claude backend into the enhancer.
    pub fn from_config(config: Config) -> Self {
        let claude = ClaudeClient::new(
            resolve_anthropic_api_key(&config),
            config.enhancer.base_url.clone(),
        );
        let enhancer = Enhancer::new(
            Arc::new(claude),
            config.enhancer.model.clone(),
            config.enhancer.max_tokens,
        );
        let whatsapp = WhatsAppChannel::new(
            resolve_account_sid(&config),
            resolve_auth_token(&config),
            resolve_from_address(&config),
            config.channels.whatsapp.base_url.clone(),
        );
        Self {
            config: Arc::new(config),
            enhancer,
            whatsapp,
            activity: ActivityLog::new(),
        }
    }
}

/// Router over the given state; exposed so tests can drive handlers directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status_page))
        .route("/webhook", post(whatsapp_webhook))
        .route("/send-message", post(send_message))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:resolved port.
/// Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    let port = config::resolve_port(&config);
    let state = AppState::from_config(config);
    let app = router(state);

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);
    log::info!("webhook URL: http://{}/webhook", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// Twilio webhook form body. Both fields default to empty when absent —
/// a malformed POST is tolerated, never rejected.
#[derive(Debug, Deserialize)]
struct WebhookForm {
    #[serde(rename = "Body", default)]
    body: String,
    #[serde(rename = "From", default)]
    from: String,
}

/// POST /webhook — Twilio forwards inbound WhatsApp messages here.
/// Enhance, record, and reply with TwiML wrapping the enhanced text.
async fn whatsapp_webhook(
    State(state): State<AppState>,
    Form(form): Form<WebhookForm>,
) -> impl IntoResponse {
    log::info!("received message from {}: {}", form.from, form.body);

    let enhanced = state.enhancer.enhance(&form.body).await;
    state
        .activity
        .append(Exchange {
            original: form.body,
            enhanced: enhanced.clone(),
            sender: form.from,
        })
        .await;

    (
        [(header::CONTENT_TYPE, "text/xml")],
        twiml_reply(&enhanced),
    )
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    to: String,
    message: String,
}

/// POST /send-message — enhance and send an outbound message via Twilio.
/// Provider failure surfaces as a generic 500; this path does not touch the
/// activity log (only webhook traffic shows on the status page).
async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let enhanced = state.enhancer.enhance(&req.message).await;
    let sid = state
        .whatsapp
        .send_message(&req.to, &enhanced)
        .await
        .map_err(|e| {
            log::warn!("send-message failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e)
        })?;
    Ok(Json(json!({ "status": "sent", "sid": sid })))
}

/// GET / — status page: recent exchanges and a running counter, refreshed
/// every 10 seconds.
async fn status_page(State(state): State<AppState>) -> Html<String> {
    let messages = state.activity.recent(STATUS_PAGE_WINDOW).await;
    let count = state.activity.count().await;
    Html(render_status_page(&messages, count))
}

fn render_status_page(messages: &[Exchange], count: usize) -> String {
    let mut page = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>WhatsApp Witty Agent</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; background-color: #f5f5f5; }
        .header { background-color: #25D366; color: white; padding: 20px; border-radius: 10px; text-align: center; }
        .message-box { background: white; padding: 15px; margin: 10px 0; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .original { color: #666; font-style: italic; }
        .enhanced { color: #25D366; font-weight: bold; margin-top: 10px; }
        .status { background: #e3f2fd; padding: 15px; border-radius: 8px; margin: 20px 0; }
    </style>
    <meta http-equiv="refresh" content="10">
</head>
<body>
    <div class="header">
        <h1>🎭 WhatsApp Witty Message Agent</h1>
        <p>Making conversations more fun, one message at a time!</p>
    </div>
    <div class="status">
        <h3>📊 System Status</h3>
        <p>✅ Agent is running and ready</p>
        <p>📱 WhatsApp webhook configured</p>
        <p>🤖 Claude AI connected</p>
"#,
    );
    page.push_str(&format!(
        "        <p>💬 Messages processed: {}</p>\n    </div>\n    <h2>Recent Messages:</h2>\n",
        count
    ));
    if messages.is_empty() {
        page.push_str("    <p>No messages yet. Send a WhatsApp message to get started!</p>\n");
    } else {
        for msg in messages {
            page.push_str("    <div class=\"message-box\">\n");
            page.push_str(&format!(
                "        <div class=\"original\"><strong>Original:</strong> {}</div>\n",
                escape_html(&msg.original)
            ));
            page.push_str(&format!(
                "        <div class=\"enhanced\"><strong>Enhanced:</strong><br>{}</div>\n",
                escape_html(&msg.enhanced).replace('\n', "<br>")
            ));
            page.push_str(&format!(
                "        <small style=\"color: #999;\">From: {}</small>\n",
                escape_html(&msg.sender)
            ));
            page.push_str("    </div>\n");
        }
    }
    page.push_str("</body>\n</html>\n");
    page
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

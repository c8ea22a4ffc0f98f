//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.quip/config.json`) and environment.
//! Credentials can live in the file or in the env vars Twilio and Anthropic
//! tooling already uses; env always wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Channel settings (WhatsApp via Twilio).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Enhancer settings (Claude model, output budget).
    #[serde(default)]
    pub enhancer: EnhancerConfig,
}

/// Gateway bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 5001). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0" — Twilio must reach the webhook).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5001
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub whatsapp: WhatsAppChannelConfig,
}

/// WhatsApp channel config (Twilio account).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppChannelConfig {
    /// Twilio account SID. Overridden by TWILIO_ACCOUNT_SID env when set.
    pub account_sid: Option<String>,
    /// Twilio auth token. Overridden by TWILIO_AUTH_TOKEN env when set.
    pub auth_token: Option<String>,
    /// Sender address for outbound messages, e.g. "whatsapp:+14155238886".
    /// Overridden by TWILIO_WHATSAPP_NUMBER env when set.
    pub from_address: Option<String>,
    /// Twilio API base URL override (tests or regional endpoints).
    pub base_url: Option<String>,
}

/// Enhancer config (Claude API key, model, output budget).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancerConfig {
    /// Anthropic API key. Overridden by ANTHROPIC_API_KEY env when set.
    pub api_key: Option<String>,
    /// Model id passed to the Messages API (default "claude-sonnet-4-20250514").
    #[serde(default = "default_enhancer_model")]
    pub model: String,
    /// Output token budget per call (default 300 — one short witty line).
    #[serde(default = "default_enhancer_max_tokens")]
    pub max_tokens: u32,
    /// Anthropic API base URL override (tests).
    pub base_url: Option<String>,
}

fn default_enhancer_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_enhancer_max_tokens() -> u32 {
    300
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_enhancer_model(),
            max_tokens: default_enhancer_max_tokens(),
            base_url: None,
        }
    }
}

fn env_or(var: &str, fallback: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            fallback
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the Twilio account SID: env TWILIO_ACCOUNT_SID overrides config.
pub fn resolve_account_sid(config: &Config) -> Option<String> {
    env_or(
        "TWILIO_ACCOUNT_SID",
        config.channels.whatsapp.account_sid.as_ref(),
    )
}

/// Resolve the Twilio auth token: env TWILIO_AUTH_TOKEN overrides config.
pub fn resolve_auth_token(config: &Config) -> Option<String> {
    env_or(
        "TWILIO_AUTH_TOKEN",
        config.channels.whatsapp.auth_token.as_ref(),
    )
}

/// Resolve the outbound from-address: env TWILIO_WHATSAPP_NUMBER overrides config.
pub fn resolve_from_address(config: &Config) -> Option<String> {
    env_or(
        "TWILIO_WHATSAPP_NUMBER",
        config.channels.whatsapp.from_address.as_ref(),
    )
}

/// Resolve the Anthropic API key: env ANTHROPIC_API_KEY overrides config.
pub fn resolve_anthropic_api_key(config: &Config) -> Option<String> {
    env_or("ANTHROPIC_API_KEY", config.enhancer.api_key.as_ref())
}

/// Resolve the listen port: env PORT overrides config.
pub fn resolve_port(config: &Config) -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(config.gateway.port)
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("QUIP_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".quip").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or QUIP_CONFIG_PATH). Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(default_config_path);
    if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        return Ok(Config::default());
    }
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing config from {}", path.display()))
}

//! Quip core library — config, WhatsApp channel, Claude-backed enhancer,
//! activity log, and the gateway HTTP server used by the CLI.

pub mod activity;
pub mod channels;
pub mod config;
pub mod enhancer;
pub mod gateway;
pub mod llm;

//! Gateway: the HTTP surface of the relay.
//!
//! Three routes on one port: the status page, the Twilio webhook, and the
//! outbound send endpoint.

mod server;

pub use server::{run_gateway, AppState};

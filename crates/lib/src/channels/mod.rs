//! Communication channels (WhatsApp via Twilio).
//!
//! The channel owns both directions of the provider protocol: the REST send
//! API for outbound messages and the TwiML document returned to webhook POSTs.

mod whatsapp;

pub use whatsapp::{twiml_reply, WhatsAppChannel};

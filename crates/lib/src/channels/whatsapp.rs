//! WhatsApp channel: outbound sends via the Twilio Messages REST API and
//! TwiML replies for inbound webhooks.

use serde::Deserialize;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Deserialize)]
struct CreateMessageResponse {
    sid: String,
}

/// WhatsApp connector backed by a Twilio account.
#[derive(Clone)]
pub struct WhatsAppChannel {
    base_url: String,
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_address: Option<String>,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_address: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| TWILIO_API_BASE.to_string());
        Self {
            base_url,
            account_sid,
            auth_token,
            from_address,
            client: reqwest::Client::new(),
        }
    }

    /// Send a WhatsApp message via the Messages endpoint. `to` is a bare
    /// number ("+15559998888"); the "whatsapp:" scheme is added here.
    /// Returns the provider message SID.
    pub async fn send_message(&self, to: &str, text: &str) -> Result<String, String> {
        let account_sid = self
            .account_sid
            .as_ref()
            .ok_or("twilio account sid not configured")?;
        let auth_token = self
            .auth_token
            .as_ref()
            .ok_or("twilio auth token not configured")?;
        let from = self
            .from_address
            .as_ref()
            .ok_or("twilio from address not configured")?;
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, account_sid
        );
        let to = if to.starts_with("whatsapp:") {
            to.to_string()
        } else {
            format!("whatsapp:{}", to)
        };
        let params = [("To", to.as_str()), ("From", from.as_str()), ("Body", text)];
        let res = self
            .client
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("twilio send failed: {} {}", status, body));
        }
        let data: CreateMessageResponse = res.json().await.map_err(|e| e.to_string())?;
        Ok(data.sid)
    }
}

/// Build the TwiML document Twilio expects as a webhook reply: one outgoing
/// message wrapping the given text.
pub fn twiml_reply(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

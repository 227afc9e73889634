use serde::Deserialize;
use sms_core::InboundMessage;

const PROVIDER: &str = "twilio";

/// Content type Twilio expects for TwiML replies.
pub const TWIML_CONTENT_TYPE: &str = "application/xml";

/// Fields of Twilio's `application/x-www-form-urlencoded` messaging webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioInbound {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
}

impl From<TwilioInbound> for InboundMessage {
    fn from(t: TwilioInbound) -> Self {
        InboundMessage {
            id: t.message_sid.unwrap_or_else(sms_core::fallback_id),
            from: t.from,
            to: t.to,
            text: t.body,
            provider: PROVIDER,
        }
    }
}

/// TwiML `<Response>` document holding zero or more `<Message>` verbs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagingResponse {
    messages: Vec<String>,
}

impl MessagingResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, body: impl Into<String>) -> Self {
        self.messages.push(body.into());
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        if self.messages.is_empty() {
            xml.push_str("<Response />");
            return xml;
        }
        xml.push_str("<Response>");
        for body in &self.messages {
            xml.push_str("<Message>");
            xml.push_str(&escape_text(body));
            xml.push_str("</Message>");
        }
        xml.push_str("</Response>");
        xml
    }
}

/// Escape XML character data. Quotes only matter inside attributes.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

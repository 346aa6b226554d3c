use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const COUNTRY_CODE: &str = "91";
const MOBILE_AGENTS: [&str; 4] = ["android", "iphone", "ipad", "ipod"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    /// `whatsapp://` deep link for phones and tablets.
    App,
    /// WhatsApp Web in a new tab.
    Web,
}

impl LinkTarget {
    pub fn from_user_agent(ua: &str) -> Self {
        let ua = ua.to_ascii_lowercase();
        if MOBILE_AGENTS.iter().any(|m| ua.contains(m)) {
            LinkTarget::App
        } else {
            LinkTarget::Web
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPhone;

impl InvalidPhone {
    pub fn message(&self) -> &'static str {
        "Invalid phone number. It must be 10 digits."
    }
}

/// Digits only, one leading trunk `0` dropped, ten digits, country prefix.
pub fn normalize_phone(raw: &str) -> Result<String, InvalidPhone> {
    let digits: String = raw.trim().chars().filter(|c| c.is_ascii_digit()).collect();
    let local = digits.strip_prefix('0').unwrap_or(&digits);
    if local.len() != 10 {
        return Err(InvalidPhone);
    }
    Ok(format!("{COUNTRY_CODE}{local}"))
}

pub fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

pub fn whatsapp_link(phone: &str, message: &str, target: LinkTarget) -> String {
    let text = encode_component(message);
    match target {
        LinkTarget::App => format!("whatsapp://send?phone={phone}&text={text}"),
        LinkTarget::Web => format!("https://web.whatsapp.com/send?phone={phone}&text={text}"),
    }
}

/// Body of `GET /create_watsapp_message_api`.
#[derive(Debug, Clone, Deserialize)]
pub struct ComposedMessage {
    pub phone: serde_json::Value,
    #[serde(default, rename = "watsapp_message")]
    pub message: Option<String>,
}

impl ComposedMessage {
    pub fn phone_text(&self) -> String {
        match &self.phone {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

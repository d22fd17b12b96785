//! Channel through which a conversation takes place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inbound channel for a conversation.
///
/// A user may hold at most one open conversation per channel, so the channel
/// participates in the open-conversation uniqueness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Browser widget on the web site.
    Web,
    /// Native mobile application.
    Mobile,
    /// Inbound email.
    Email,
    /// Third-party chat application (WhatsApp, Telegram, ...).
    ChatApp,
    /// Direct API integration.
    Api,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Channel::Web => "web",
            Channel::Mobile => "mobile",
            Channel::Email => "email",
            Channel::ChatApp => "chat_app",
            Channel::Api => "api",
        };
        write!(f, "{}", s)
    }
}

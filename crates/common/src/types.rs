//! Identifiers and message payloads shared by channels, devices and bots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A conversation endpoint (one chat on one channel account).
///
/// Sessions are created on the first inbound unit that references them and
/// live for the whole process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::invalid_id("session", id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for SessionId {
    fn from(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }
}

/// Opaque handle of a controllable peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::invalid_id("device", id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raw, device-sourced frame pushed outside any request/response pair.
///
/// The payload is kept as untyped JSON; decoding into events happens in the
/// devices crate and is lossy by design of the wire (malformed frames are
/// dropped there).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotifyFrame(pub serde_json::Value);

/// One labeled button carrying the opaque callback value sent back on press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub value: String,
}

/// Structured interactive-control descriptor: a title and rows of buttons.
///
/// ```
/// use pixelbot_common::types::InlineKeyboard;
///
/// let kb = InlineKeyboard::new("Scoreboard")
///     .text("Home", "score_home")
///     .text("Visit", "score_visit")
///     .row()
///     .text("Reset", "score_reset");
/// assert_eq!(kb.rows.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub title: String,
    pub rows: Vec<Vec<Button>>,
}

impl InlineKeyboard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: vec![Vec::new()],
        }
    }

    /// Append a button to the current row.
    #[must_use]
    pub fn text(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        let button = Button {
            label: label.into(),
            value: value.into(),
        };
        match self.rows.last_mut() {
            Some(row) => row.push(button),
            None => self.rows.push(vec![button]),
        }
        self
    }

    /// Start a new row. Consecutive calls do not produce empty rows.
    #[must_use]
    pub fn row(mut self) -> Self {
        if self.rows.last().is_some_and(|r| !r.is_empty()) {
            self.rows.push(Vec::new());
        }
        self
    }

    /// All callback values carried by this keyboard, in display order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|b| b.value.as_str())
    }

    /// Rows with trailing empty rows removed.
    pub fn non_empty_rows(&self) -> impl Iterator<Item = &[Button]> {
        self.rows.iter().filter(|r| !r.is_empty()).map(Vec::as_slice)
    }
}

/// Content handed to the outbound collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundContent {
    Text(String),
    Keyboard(InlineKeyboard),
}

impl From<String> for OutboundContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for OutboundContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<InlineKeyboard> for OutboundContent {
    fn from(kb: InlineKeyboard) -> Self {
        Self::Keyboard(kb)
    }
}

//! Text helpers for showing hits in a terminal.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_segmentation::UnicodeSegmentation;

/// Message kinds the backend indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Photo,
    Video,
    Document,
    Voice,
    Audio,
    Poll,
    Story,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        MessageType::Text,
        MessageType::Photo,
        MessageType::Video,
        MessageType::Document,
        MessageType::Voice,
        MessageType::Audio,
        MessageType::Poll,
        MessageType::Story,
    ];

    /// Wire name, as used in the `types` filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Photo => "photo",
            MessageType::Video => "video",
            MessageType::Document => "document",
            MessageType::Voice => "voice",
            MessageType::Audio => "audio",
            MessageType::Poll => "poll",
            MessageType::Story => "story",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MessageType::Text => "Text",
            MessageType::Photo => "Photo",
            MessageType::Video => "Video",
            MessageType::Document => "Document",
            MessageType::Voice => "Voice",
            MessageType::Audio => "Audio",
            MessageType::Poll => "Poll",
            MessageType::Story => "Story",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown message type: {}", s))
    }
}

/// Label for a raw type string; unknown types are shown as-is.
pub fn message_type_label(raw: &str) -> String {
    raw.parse::<MessageType>()
        .map(|t| t.label().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Cut `text` to at most `max_graphemes` user-visible characters, adding
/// `...` when something was dropped.
pub fn truncate_text(text: &str, max_graphemes: usize) -> String {
    let mut graphemes = text.grapheme_indices(true);
    match graphemes.nth(max_graphemes) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, UNITS[unit])
    }
}

/// "just now", "5 minutes ago", ... up to a week, then a local date.
pub fn relative_time(sent_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(sent_at);
    let minutes = diff.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if diff.num_hours() < 24 {
        plural(diff.num_hours(), "hour")
    } else if diff.num_days() < 7 {
        plural(diff.num_days(), "day")
    } else {
        sent_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_message_type_parse() {
        assert_eq!("photo".parse::<MessageType>().unwrap(), MessageType::Photo);
        assert_eq!(" Voice ".parse::<MessageType>().unwrap(), MessageType::Voice);
        assert!("sticker".parse::<MessageType>().is_err());
        assert_eq!(message_type_label("story"), "Story");
        assert_eq!(message_type_label("sticker"), "sticker");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly", 7), "exactly");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        // multi-byte graphemes are never split
        assert_eq!(truncate_text("삼성전자 주가", 2), "삼성...");
        assert_eq!(truncate_text("e\u{301}e\u{301}e\u{301}", 1), "e\u{301}...");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 * 1024), "3072 GB");
    }

    #[test]
    fn test_relative_time() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(relative_time(now - Duration::seconds(30), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(45), now), "45 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2 days ago");
        let old = relative_time(now - Duration::days(30), now);
        assert!(old.starts_with("2023-"));
    }
}

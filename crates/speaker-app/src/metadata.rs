//! Track metadata reported by the connected source over AVRC.
//!
//! Attribute ids and playback status codes use the values of the Bluetooth
//! AVRC target notifications, as delivered by the ESP-IDF Bluedroid stack.

use alloc::string::String;

/// Placeholder for text attributes the source has not sent yet
pub const UNKNOWN: &str = "Unknown";

/// AVRC playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
    ForwardSeek,
    ReverseSeek,
    Error,
}

impl PlaybackStatus {
    /// Decode an AVRC play status code
    ///
    /// Unknown codes map to `Error`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => PlaybackStatus::Stopped,
            0x01 => PlaybackStatus::Playing,
            0x02 => PlaybackStatus::Paused,
            0x03 => PlaybackStatus::ForwardSeek,
            0x04 => PlaybackStatus::ReverseSeek,
            _ => PlaybackStatus::Error,
        }
    }
}

/// AVRC media attribute ids (one bit each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataAttribute {
    Title,
    Artist,
    Album,
    TrackNumber,
    TrackCount,
    Genre,
    PlayingTime,
}

impl MetadataAttribute {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(MetadataAttribute::Title),
            0x02 => Some(MetadataAttribute::Artist),
            0x04 => Some(MetadataAttribute::Album),
            0x08 => Some(MetadataAttribute::TrackNumber),
            0x10 => Some(MetadataAttribute::TrackCount),
            0x20 => Some(MetadataAttribute::Genre),
            0x40 => Some(MetadataAttribute::PlayingTime),
            _ => None,
        }
    }

    pub fn mask(self) -> u8 {
        match self {
            MetadataAttribute::Title => 0x01,
            MetadataAttribute::Artist => 0x02,
            MetadataAttribute::Album => 0x04,
            MetadataAttribute::TrackNumber => 0x08,
            MetadataAttribute::TrackCount => 0x10,
            MetadataAttribute::Genre => 0x20,
            MetadataAttribute::PlayingTime => 0x40,
        }
    }
}

/// Attributes requested from the source after connecting
pub const REQUESTED_ATTRIBUTES: u8 = 0x01 | 0x02 | 0x04 | 0x40;

/// Last-known state of the remote player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub status: PlaybackStatus,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Track length in milliseconds
    pub playtime_ms: u32,
    /// Play position in milliseconds
    pub position_ms: u32,
    /// AVRC absolute volume, 0..=127
    pub volume: u8,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            title: String::from(UNKNOWN),
            artist: String::from(UNKNOWN),
            album: String::from(UNKNOWN),
            playtime_ms: 0,
            position_ms: 0,
            volume: 0,
        }
    }
}

impl Metadata {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Apply one attribute response
    ///
    /// `data` is the raw attribute text; it may carry a trailing NUL. Returns
    /// `false` for attributes this model does not keep.
    pub fn apply_attribute(&mut self, id: u8, data: &[u8]) -> bool {
        let text = attribute_text(data);
        match MetadataAttribute::from_id(id) {
            Some(MetadataAttribute::Title) => self.title = text,
            Some(MetadataAttribute::Artist) => self.artist = text,
            Some(MetadataAttribute::Album) => self.album = text,
            Some(MetadataAttribute::PlayingTime) => self.playtime_ms = parse_leading_u32(&text),
            _ => return false,
        }
        true
    }
}

fn attribute_text(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Parse the leading decimal number of `text`
///
/// Leading whitespace and a `+` sign are skipped, parsing stops at the first
/// non-digit, and text without digits yields 0. Negative numbers yield 0 and
/// values beyond `u32::MAX` saturate.
pub fn parse_leading_u32(text: &str) -> u32 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: u32 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value
            .saturating_mul(10)
            .saturating_add(u32::from(digit - b'0'));
    }

    if negative {
        0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unknown_and_stopped() {
        let meta = Metadata::default();
        assert_eq!(meta.title, "Unknown");
        assert_eq!(meta.artist, "Unknown");
        assert_eq!(meta.album, "Unknown");
        assert_eq!(meta.status, PlaybackStatus::Stopped);
        assert!(!meta.is_playing());
    }

    #[test]
    fn text_attributes_stop_at_nul() {
        let mut meta = Metadata::default();
        assert!(meta.apply_attribute(0x01, b"Song 2\0garbage"));
        assert!(meta.apply_attribute(0x02, b"Blur"));
        assert!(meta.apply_attribute(0x04, b"Blur\0"));
        assert_eq!(meta.title, "Song 2");
        assert_eq!(meta.artist, "Blur");
        assert_eq!(meta.album, "Blur");
    }

    #[test]
    fn playing_time_is_parsed_leniently() {
        let mut meta = Metadata::default();
        assert!(meta.apply_attribute(0x40, b"122000\0"));
        assert_eq!(meta.playtime_ms, 122_000);
        meta.apply_attribute(0x40, b"  42abc");
        assert_eq!(meta.playtime_ms, 42);
        meta.apply_attribute(0x40, b"n/a");
        assert_eq!(meta.playtime_ms, 0);
    }

    #[test]
    fn unsupported_attributes_are_ignored() {
        let mut meta = Metadata::default();
        assert!(!meta.apply_attribute(0x20, b"Britpop"));
        assert!(!meta.apply_attribute(0x80, b"?"));
        assert_eq!(meta, Metadata::default());
    }

    #[test]
    fn leading_number_edge_cases() {
        assert_eq!(parse_leading_u32("+17"), 17);
        assert_eq!(parse_leading_u32("-17"), 0);
        assert_eq!(parse_leading_u32(""), 0);
        assert_eq!(parse_leading_u32("99999999999"), u32::MAX);
    }

    #[test]
    fn status_codes() {
        assert_eq!(PlaybackStatus::from_code(1), PlaybackStatus::Playing);
        assert_eq!(PlaybackStatus::from_code(2), PlaybackStatus::Paused);
        assert_eq!(PlaybackStatus::from_code(0xFF), PlaybackStatus::Error);
    }

    #[test]
    fn requested_mask_covers_kept_attributes() {
        for attribute in [
            MetadataAttribute::Title,
            MetadataAttribute::Artist,
            MetadataAttribute::Album,
            MetadataAttribute::PlayingTime,
        ] {
            assert_ne!(REQUESTED_ATTRIBUTES & attribute.mask(), 0);
            assert_eq!(MetadataAttribute::from_id(attribute.mask()), Some(attribute));
        }
        assert_eq!(REQUESTED_ATTRIBUTES & MetadataAttribute::Genre.mask(), 0);
    }
}

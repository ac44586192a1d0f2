//! Requested video quality and its per-strategy parameter mappings.

use serde::{Deserialize, Serialize};

/// Video quality requested by the client.
///
/// Both acquisition strategies honor the same height-cap semantics even
/// though their parameter encodings differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    #[serde(rename = "480")]
    Q480,
    #[default]
    #[serde(rename = "720")]
    Q720,
    #[serde(rename = "1080")]
    Q1080,
    #[serde(rename = "best")]
    Best,
}

impl Quality {
    /// Wire representation of the quality.
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Q480 => "480",
            Quality::Q720 => "720",
            Quality::Q1080 => "1080",
            Quality::Best => "best",
        }
    }

    /// yt-dlp format selector for this quality.
    ///
    /// Uses separate video + audio streams for better compatibility with
    /// Shorts and restricted videos. `Best` imposes no height cap.
    pub fn format_selector(&self) -> &'static str {
        match self {
            Quality::Q480 => "bv*[height<=480]+ba/best",
            Quality::Q720 => "bv*[height<=720]+ba/best",
            Quality::Q1080 => "bv*[height<=1080]+ba/best",
            Quality::Best => "bv*+ba/best",
        }
    }

    /// `videoQuality` parameter for the Cobalt fallback API.
    pub fn cobalt_param(&self) -> &'static str {
        match self {
            Quality::Q480 => "480",
            Quality::Q720 => "720",
            Quality::Q1080 => "1080",
            Quality::Best => "max",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trips_wire_strings() {
        for (quality, wire) in [
            (Quality::Q480, "\"480\""),
            (Quality::Q720, "\"720\""),
            (Quality::Q1080, "\"1080\""),
            (Quality::Best, "\"best\""),
        ] {
            assert_eq!(serde_json::to_string(&quality).unwrap(), wire);
            let parsed: Quality = serde_json::from_str(wire).unwrap();
            assert_eq!(parsed, quality);
        }
    }

    #[test]
    fn best_has_no_height_cap() {
        assert!(!Quality::Best.format_selector().contains("height"));
        assert_eq!(Quality::Best.cobalt_param(), "max");
    }

    #[test]
    fn capped_qualities_match_requested_height() {
        assert!(Quality::Q480.format_selector().contains("height<=480"));
        assert!(Quality::Q720.format_selector().contains("height<=720"));
        assert!(Quality::Q1080.format_selector().contains("height<=1080"));
        assert_eq!(Quality::Q480.cobalt_param(), "480");
        assert_eq!(Quality::Q1080.cobalt_param(), "1080");
    }
}

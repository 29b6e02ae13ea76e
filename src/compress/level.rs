//! Compression levels and their fixed parameter profiles

use serde::Serialize;
use std::fmt;

/// Named compression preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
    Extreme,
}

/// Image downsampling filters handed to the external tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownsampleTypes {
    pub color: &'static str,
    pub gray: &'static str,
    pub mono: &'static str,
}

/// Parameters used by both strategies for a given level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProfile {
    /// Ghostscript `-dPDFSETTINGS` preset
    pub pdf_settings: &'static str,
    /// Target resolution for color, gray and mono images (dpi)
    pub image_resolution: Option<u32>,
    /// Downsampling filters, when the preset default is not aggressive enough
    pub downsample: Option<DownsampleTypes>,
    /// Objects handled per unit of fallback work. Lower is more thorough.
    pub work_granularity: usize,
}

const LOW: LevelProfile = LevelProfile {
    pdf_settings: "/printer",
    image_resolution: None,
    downsample: None,
    work_granularity: 50,
};

const MEDIUM: LevelProfile = LevelProfile {
    pdf_settings: "/ebook",
    image_resolution: None,
    downsample: None,
    work_granularity: 20,
};

const HIGH: LevelProfile = LevelProfile {
    pdf_settings: "/screen",
    image_resolution: Some(100),
    downsample: None,
    work_granularity: 10,
};

const EXTREME: LevelProfile = LevelProfile {
    pdf_settings: "/screen",
    image_resolution: Some(50),
    downsample: Some(DownsampleTypes {
        color: "/Average",
        gray: "/Average",
        mono: "/Subsample",
    }),
    work_granularity: 5,
};

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 4] = [
        CompressionLevel::Low,
        CompressionLevel::Medium,
        CompressionLevel::High,
        CompressionLevel::Extreme,
    ];

    /// Parse a level token from a request.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Unknown or empty tokens resolve to [`CompressionLevel::Medium`].
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "low" => CompressionLevel::Low,
            "medium" => CompressionLevel::Medium,
            "high" => CompressionLevel::High,
            "extreme" => CompressionLevel::Extreme,
            other => {
                if !other.is_empty() {
                    tracing::debug!(token = other, "unknown compression level, using medium");
                }
                CompressionLevel::Medium
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
            CompressionLevel::Extreme => "extreme",
        }
    }

    pub fn profile(&self) -> &'static LevelProfile {
        match self {
            CompressionLevel::Low => &LOW,
            CompressionLevel::Medium => &MEDIUM,
            CompressionLevel::High => &HIGH,
            CompressionLevel::Extreme => &EXTREME,
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("low", CompressionLevel::Low)]
    #[case("medium", CompressionLevel::Medium)]
    #[case("high", CompressionLevel::High)]
    #[case("extreme", CompressionLevel::Extreme)]
    #[case("  HIGH ", CompressionLevel::High)]
    #[case("ultra", CompressionLevel::Medium)]
    #[case("", CompressionLevel::Medium)]
    fn test_from_token(#[case] token: &str, #[case] expected: CompressionLevel) {
        assert_eq!(CompressionLevel::from_token(token), expected);
    }

    #[test]
    fn test_unknown_token_uses_medium_profile() {
        assert_eq!(
            CompressionLevel::from_token("bogus").profile(),
            CompressionLevel::Medium.profile()
        );
    }

    #[test]
    fn test_granularity_decreases_with_aggressiveness() {
        let granularities: Vec<usize> = CompressionLevel::ALL
            .iter()
            .map(|level| level.profile().work_granularity)
            .collect();
        assert_eq!(granularities, vec![50, 20, 10, 5]);
    }

    #[test]
    fn test_display_round_trips_token() {
        for level in CompressionLevel::ALL {
            assert_eq!(CompressionLevel::from_token(&level.to_string()), level);
        }
    }

    #[test]
    fn test_only_extreme_overrides_downsampling() {
        assert!(CompressionLevel::Extreme.profile().downsample.is_some());
        assert!(CompressionLevel::High.profile().downsample.is_none());
        assert_eq!(CompressionLevel::High.profile().image_resolution, Some(100));
    }
}

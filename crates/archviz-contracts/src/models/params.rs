use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("unsupported resolution '{0}' (expected one of 1K, 2K, 4K, 6K)")]
    Resolution(String),
    #[error("unsupported aspect ratio '{0}' (expected one of 1:1, 3:4, 4:3, 16:9, 9:16)")]
    AspectRatio(String),
    #[error("unsupported video aspect ratio '{0}' (expected 16:9 or 9:16)")]
    VideoAspectRatio(String),
}

/// Output resolution tier requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
    #[serde(rename = "6K")]
    SixK,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::OneK,
        Resolution::TwoK,
        Resolution::FourK,
        Resolution::SixK,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::OneK => "1K",
            Resolution::TwoK => "2K",
            Resolution::FourK => "4K",
            Resolution::SixK => "6K",
        }
    }

    pub fn is_high_fidelity(self) -> bool {
        !matches!(self, Resolution::OneK)
    }

    /// Value sent as `imageSize`. The remote model tops out at 4K, so 6K is clamped.
    pub fn request_image_size(self) -> Option<&'static str> {
        match self {
            Resolution::OneK => None,
            Resolution::TwoK => Some("2K"),
            Resolution::FourK | Resolution::SixK => Some("4K"),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ParamError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ParamError::Resolution(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "16:9")]
    Wide16x9,
    #[serde(rename = "9:16")]
    Tall9x16,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Wide16x9,
        AspectRatio::Tall9x16,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Wide16x9 => "16:9",
            AspectRatio::Tall9x16 => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ParamError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ParamError::AspectRatio(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoAspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl VideoAspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoAspectRatio::Landscape => "16:9",
            VideoAspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for VideoAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoAspectRatio {
    type Err = ParamError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "16:9" => Ok(VideoAspectRatio::Landscape),
            "9:16" => Ok(VideoAspectRatio::Portrait),
            _ => Err(ParamError::VideoAspectRatio(raw.to_string())),
        }
    }
}

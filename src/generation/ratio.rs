//! Aspect ratio tokens and their fixed pixel dimensions.

use crate::error::JimengError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported image aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ratio {
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "3:4")]
    ThreeFour,
    #[serde(rename = "16:9")]
    SixteenNine,
    #[serde(rename = "9:16")]
    NineSixteen,
}

/// Output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

impl Ratio {
    /// All ratios, in the order they are advertised.
    pub const ALL: [Ratio; 4] = [
        Ratio::FourThree,
        Ratio::ThreeFour,
        Ratio::SixteenNine,
        Ratio::NineSixteen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Ratio::FourThree => "4:3",
            Ratio::ThreeFour => "3:4",
            Ratio::SixteenNine => "16:9",
            Ratio::NineSixteen => "9:16",
        }
    }

    pub fn dimensions(self) -> Dimensions {
        let (width, height) = match self {
            Ratio::FourThree => (512, 384),
            Ratio::ThreeFour => (384, 512),
            Ratio::SixteenNine => (512, 288),
            Ratio::NineSixteen => (288, 512),
        };
        Dimensions { width, height }
    }

    /// Tokens accepted by [`Ratio::from_str`].
    pub fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(|r| r.as_str()).collect()
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ratio {
    type Err = JimengError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| {
                JimengError::Validation(format!(
                    "Unsupported ratio: {} (supported: {})",
                    s,
                    Self::supported().join(", ")
                ))
            })
    }
}

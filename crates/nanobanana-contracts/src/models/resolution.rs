use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse output quality level. Only some models accept one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionTier {
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ResolutionTier {
    pub const ALL: [ResolutionTier; 3] = [Self::OneK, Self::TwoK, Self::FourK];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionTier {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == raw)
            .ok_or_else(|| format!("invalid resolution '{raw}' (expected one of: 1K, 2K, 4K)"))
    }
}

#[cfg(test)]
mod tests {
    use super::ResolutionTier;

    #[test]
    fn parses_exact_tier_names_only() {
        assert_eq!("2K".parse::<ResolutionTier>(), Ok(ResolutionTier::TwoK));
        assert!("2k".parse::<ResolutionTier>().is_err());
        assert!("8K".parse::<ResolutionTier>().is_err());
    }

    #[test]
    fn serializes_as_tier_label() {
        let raw = serde_json::to_string(&ResolutionTier::FourK).unwrap_or_default();
        assert_eq!(raw, "\"4K\"");
    }
}

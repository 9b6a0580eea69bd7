//! Avalanche danger scale and trend classification.

use serde::{Deserialize, Serialize};

/// North American avalanche danger level (ordinal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DangerLevel {
    Low,
    Moderate,
    Considerable,
    High,
}

impl DangerLevel {
    pub const ALL: [DangerLevel; 4] = [
        DangerLevel::Low,
        DangerLevel::Moderate,
        DangerLevel::Considerable,
        DangerLevel::High,
    ];

    /// Parse a forecast-archive danger string. Anything else ("No Rating",
    /// "Extreme", blank) is treated as missing.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Low" => Some(DangerLevel::Low),
            "Moderate" => Some(DangerLevel::Moderate),
            "Considerable" => Some(DangerLevel::Considerable),
            "High" => Some(DangerLevel::High),
            _ => None,
        }
    }

    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DangerLevel::Low => "Low",
            DangerLevel::Moderate => "Moderate",
            DangerLevel::Considerable => "Considerable",
            DangerLevel::High => "High",
        }
    }
}

impl std::fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elevation band of a danger rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationBand {
    BelowTreeline,
    NearTreeline,
    AboveTreeline,
}

impl ElevationBand {
    /// Column name in the forecast archive.
    pub fn column(&self) -> &'static str {
        match self {
            ElevationBand::BelowTreeline => "Day1DangerBelowTreeline",
            ElevationBand::NearTreeline => "Day1DangerNearTreeline",
            ElevationBand::AboveTreeline => "Day1DangerAboveTreeline",
        }
    }
}

/// Direction of the danger rating relative to the previous forecast of the
/// same zone and season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    /// First forecast of the zone/season.
    Initial,
    Flat,
    Rising,
    Falling,
    /// Either this or the previous rating is missing.
    Unknown,
}

impl Trend {
    /// Trend between two consecutive ordinal ratings.
    pub fn between(previous: Option<u8>, current: Option<u8>) -> Self {
        match (previous, current) {
            (Some(p), Some(c)) if p == c => Trend::Flat,
            (Some(p), Some(c)) if p < c => Trend::Rising,
            (Some(_), Some(_)) => Trend::Falling,
            _ => Trend::Unknown,
        }
    }

    /// Suffix appended to the base label, e.g. "_Rising".
    pub fn suffix(&self) -> &'static str {
        match self {
            Trend::Initial => "_Initial",
            Trend::Flat => "_Flat",
            Trend::Rising => "_Rising",
            Trend::Falling => "_Falling",
            Trend::Unknown => "_Unknown",
        }
    }
}

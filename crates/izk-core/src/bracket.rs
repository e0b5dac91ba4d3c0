//! # Household Income Brackets
//!
//! The ten DOSM household income groups (B1–B4, M1–M4, T1–T2) and the
//! thresholds that separate them. Published bounds are inclusive upper
//! limits (B1 is "≤ 2560"); the circuit compares with strict less-than, so
//! [`BRACKET_THRESHOLDS`] stores each published bound plus one and bracket
//! `i` is the half-open range `[t_{i-1}, t_i)`.
//!
//! These constants are fixed at deployment. Changing any of them changes the
//! circuit and therefore its fingerprint.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of brackets in the classification vector.
pub const BRACKET_COUNT: usize = 10;

/// Exclusive upper bounds of brackets 0..=8, in currency units.
///
/// Bracket 9 (T2) is unbounded above.
pub const BRACKET_THRESHOLDS: [u64; BRACKET_COUNT - 1] =
    [2561, 3440, 4310, 5250, 6340, 7690, 9450, 11820, 15870];

/// Incomes at or above this sentinel are treated as implausible and make the
/// record unauthentic.
pub const INCOME_UPPER_BOUND: u64 = 1_000_000;

/// A household income group, in ascending income order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BracketLabel {
    /// ≤ 2560.
    B1,
    /// 2561 – 3439.
    B2,
    /// 3440 – 4309.
    B3,
    /// 4310 – 5249.
    B4,
    /// 5250 – 6339.
    M1,
    /// 6340 – 7689.
    M2,
    /// 7690 – 9449.
    M3,
    /// 9450 – 11819.
    M4,
    /// 11820 – 15869.
    T1,
    /// ≥ 15870.
    T2,
}

impl BracketLabel {
    /// All labels in vector order.
    pub const ALL: [BracketLabel; BRACKET_COUNT] = [
        Self::B1,
        Self::B2,
        Self::B3,
        Self::B4,
        Self::M1,
        Self::M2,
        Self::M3,
        Self::M4,
        Self::T1,
        Self::T2,
    ];

    /// Position in the one-hot vector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Label for a vector position.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBracketIndex`] for `index >= 10`.
    pub fn from_index(index: usize) -> Result<Self, ValidationError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ValidationError::InvalidBracketIndex(index))
    }

    /// The bracket an income falls into.
    pub fn for_income(monthly_income: u64) -> Self {
        let index = BRACKET_THRESHOLDS
            .iter()
            .position(|t| monthly_income < *t)
            .unwrap_or(BRACKET_COUNT - 1);
        Self::ALL[index]
    }

    /// Inclusive lower and upper income bounds; `None` upper for T2.
    pub fn range(self) -> (u64, Option<u64>) {
        let i = self.index();
        let lo = if i == 0 { 0 } else { BRACKET_THRESHOLDS[i - 1] };
        let hi = BRACKET_THRESHOLDS.get(i).map(|t| t - 1);
        (lo, hi)
    }

    /// The short label, e.g. `"M2"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::B3 => "B3",
            Self::B4 => "B4",
            Self::M1 => "M1",
            Self::M2 => "M2",
            Self::M3 => "M3",
            Self::M4 => "M4",
            Self::T1 => "T1",
            Self::T2 => "T2",
        }
    }

    /// Aid-program eligibility grouping.
    pub fn eligibility_class(self) -> EligibilityClass {
        match self {
            Self::B1 | Self::B2 | Self::B3 | Self::B4 => EligibilityClass::B40,
            Self::M1 | Self::M2 => EligibilityClass::M40M1,
            Self::M3 | Self::M4 => EligibilityClass::M40M2,
            Self::T1 | Self::T2 => EligibilityClass::T20,
        }
    }
}

impl std::fmt::Display for BracketLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BracketLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownBracketLabel(s.to_string()))
    }
}

/// Aid-program eligibility groups derived from the bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EligibilityClass {
    /// Bottom 40%: B1–B4.
    #[serde(rename = "B40")]
    B40,
    /// Lower middle 40%: M1–M2.
    #[serde(rename = "M40-M1")]
    M40M1,
    /// Upper middle 40%: M3–M4.
    #[serde(rename = "M40-M2")]
    M40M2,
    /// Top 20%: T1–T2.
    #[serde(rename = "T20")]
    T20,
}

impl EligibilityClass {
    /// Wire name, e.g. `"M40-M1"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::B40 => "B40",
            Self::M40M1 => "M40-M1",
            Self::M40M2 => "M40-M2",
            Self::T20 => "T20",
        }
    }
}

impl std::fmt::Display for EligibilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of decoding a published bracket vector.
///
/// Serializes as the bare label (`"B1"`) or the string `"unauthentic"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The record was authentic and falls into this bracket.
    Bracket(BracketLabel),
    /// The record failed an authenticity check; the vector was all zero.
    Unauthentic,
}

impl Classification {
    /// The bracket, if authentic.
    pub fn label(self) -> Option<BracketLabel> {
        match self {
            Self::Bracket(l) => Some(l),
            Self::Unauthentic => None,
        }
    }

    /// The eligibility class, if authentic.
    pub fn eligibility_class(self) -> Option<EligibilityClass> {
        self.label().map(BracketLabel::eligibility_class)
    }

    /// Wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bracket(l) => l.as_str(),
            Self::Unauthentic => "unauthentic",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Classification {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Classification {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "unauthentic" {
            return Ok(Self::Unauthentic);
        }
        s.parse::<BracketLabel>()
            .map(Self::Bracket)
            .map_err(serde::de::Error::custom)
    }
}

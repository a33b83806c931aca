//! Severity levels and their aggregation order.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Severity Level ==
/// Outcome of any classification.
///
/// Aggregation order is severe > warning > good. `Unknown` never contributes
/// to aggregates. The legacy colour names (`green`, `orange`, `red`, `gray`)
/// are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    #[default]
    #[serde(alias = "green")]
    Good,
    #[serde(alias = "orange")]
    Warning,
    #[serde(alias = "red")]
    Severe,
    #[serde(alias = "gray", alias = "grey")]
    Unknown,
}

impl SeverityLevel {
    /// Aggregation rank; `None` for `Unknown`.
    fn rank(self) -> Option<u8> {
        match self {
            SeverityLevel::Good => Some(0),
            SeverityLevel::Warning => Some(1),
            SeverityLevel::Severe => Some(2),
            SeverityLevel::Unknown => None,
        }
    }

    /// The more severe of `self` and `other`, ignoring `Unknown` operands.
    pub fn worse(self, other: SeverityLevel) -> SeverityLevel {
        match (self.rank(), other.rank()) {
            (_, None) => self,
            (None, Some(_)) => other,
            (Some(a), Some(b)) => {
                if b > a {
                    other
                } else {
                    self
                }
            }
        }
    }

    /// Warning and severe count as issues.
    pub fn is_issue(self) -> bool {
        matches!(self, SeverityLevel::Warning | SeverityLevel::Severe)
    }

    /// Wording used in plot summaries.
    pub fn verdict(self) -> &'static str {
        match self {
            SeverityLevel::Good => "SAFE",
            SeverityLevel::Warning => "CONSIDERABLE",
            SeverityLevel::Severe => "DANGEROUS",
            SeverityLevel::Unknown => "UNKNOWN",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Good => "good",
            SeverityLevel::Warning => "warning",
            SeverityLevel::Severe => "severe",
            SeverityLevel::Unknown => "unknown",
        }
    }

    /// Parses canonical or legacy colour names.
    pub fn parse(name: &str) -> Option<SeverityLevel> {
        match name {
            "good" | "green" => Some(SeverityLevel::Good),
            "warning" | "orange" => Some(SeverityLevel::Warning),
            "severe" | "red" => Some(SeverityLevel::Severe),
            "unknown" | "gray" | "grey" => Some(SeverityLevel::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SeverityLevel::*;

    #[test]
    fn test_worse_ordering() {
        assert_eq!(Good.worse(Warning), Warning);
        assert_eq!(Warning.worse(Good), Warning);
        assert_eq!(Warning.worse(Severe), Severe);
        assert_eq!(Severe.worse(Warning), Severe);
        assert_eq!(Good.worse(Good), Good);
    }

    #[test]
    fn test_unknown_never_contributes() {
        assert_eq!(Good.worse(Unknown), Good);
        assert_eq!(Severe.worse(Unknown), Severe);
        assert_eq!(Unknown.worse(Warning), Warning);
        assert!(!Unknown.is_issue());
    }

    #[test]
    fn test_serde_names_and_aliases() {
        assert_eq!(serde_json::to_string(&Severe).unwrap(), "\"severe\"");
        let parsed: SeverityLevel = serde_json::from_str("\"orange\"").unwrap();
        assert_eq!(parsed, Warning);
        let parsed: SeverityLevel = serde_json::from_str("\"gray\"").unwrap();
        assert_eq!(parsed, Unknown);
    }

    #[test]
    fn test_parse_matches_serde() {
        for name in ["good", "green", "warning", "orange", "severe", "red", "unknown", "gray"] {
            let via_serde: SeverityLevel = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(SeverityLevel::parse(name), Some(via_serde));
        }
        assert_eq!(SeverityLevel::parse("purple"), None);
    }
}

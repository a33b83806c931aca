//! IPv4 ranges and dotted-quad parsing.

use serde::{Deserialize, Serialize};

// == IP Range ==
/// Inclusive `[low, high]` block of IPv4 addresses assigned to one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    pub low: u32,
    pub high: u32,
    pub country: String,
}

impl IpRange {
    pub fn new(low: u32, high: u32, country: impl Into<String>) -> Self {
        Self {
            low,
            high,
            country: country.into(),
        }
    }

    pub fn contains(&self, ip: u32) -> bool {
        self.low <= ip && ip <= self.high
    }

    /// Parses one IP2Location-LITE-DB1 row:
    /// `"16777216","16777471","AU","Australia"`.
    ///
    /// Fields are taken at fixed positions after splitting on `"`.
    /// Rows missing a field or with non-numeric bounds yield `None`.
    pub fn from_csv_row(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('"').collect();
        let low = fields.get(1)?.trim().parse().ok()?;
        let high = fields.get(3)?.trim().parse().ok()?;
        let country = fields.get(7)?;
        Some(Self::new(low, high, *country))
    }
}

// == Parse IPv4 ==
/// Converts a dotted quad into `s0·2^24 + s1·2^16 + s2·2^8 + s3`.
///
/// Exactly four segments of ASCII digits, each at most 255, are required.
pub fn parse_ipv4(ip: &str) -> Option<u32> {
    let mut segments = ip.split('.');
    let mut value: u32 = 0;

    for _ in 0..4 {
        let segment = segments.next()?;
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let octet: u8 = segment.parse().ok()?;
        value = (value << 8) | u32::from(octet);
    }

    if segments.next().is_some() {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_valid() {
        assert_eq!(parse_ipv4("0.0.0.0"), Some(0));
        assert_eq!(parse_ipv4("1.0.0.0"), Some(16_777_216));
        assert_eq!(parse_ipv4("1.2.3.4"), Some(16_909_060));
        assert_eq!(parse_ipv4("255.255.255.255"), Some(u32::MAX));
    }

    #[test]
    fn test_parse_ipv4_malformed() {
        for bad in [
            "",
            "1.2.3",
            "1.2.3.4.5",
            "256.1.1.1",
            "1.2.3.-4",
            "a.b.c.d",
            "1..3.4",
            " 1.2.3.4",
            "::1",
        ] {
            assert_eq!(parse_ipv4(bad), None, "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let range = IpRange::new(10, 20, "Chile");
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(9));
        assert!(!range.contains(21));
    }

    #[test]
    fn test_csv_row() {
        let row = IpRange::from_csv_row(r#""16777216","16777471","AU","Australia""#).unwrap();
        assert_eq!(row, IpRange::new(16_777_216, 16_777_471, "Australia"));
        assert!(row.contains(16_777_300));
        assert!(!row.contains(16_777_472));
    }

    #[test]
    fn test_csv_row_rejects_garbage() {
        assert!(IpRange::from_csv_row("").is_none());
        assert!(IpRange::from_csv_row(r#""x","2","AU","Australia""#).is_none());
        assert!(IpRange::from_csv_row(r#""1","2","AU""#).is_none());
    }
}

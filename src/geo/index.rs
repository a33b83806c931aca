//! Geo Range Index Module
//!
//! Immutable sorted table of disjoint IPv4 ranges queried by binary search.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::range::{parse_ipv4, IpRange};
use super::UNKNOWN_COUNTRY;
use crate::error::GeoError;

// == Geo Range Index ==
#[derive(Debug, Clone, Default)]
pub struct GeoRangeIndex {
    /// Sorted ascending by `low`, mutually disjoint
    ranges: Vec<IpRange>,
}

impl GeoRangeIndex {
    // == Build ==
    /// Wraps `rows` as-is. Rows must already be sorted and disjoint.
    pub fn build(rows: Vec<IpRange>) -> Self {
        Self { ranges: rows }
    }

    // == From CSV ==
    /// Parses an IP2Location-LITE-DB1 style dataset, skipping unreadable rows.
    pub fn from_csv(text: &str) -> Self {
        let mut skipped = 0usize;
        let ranges: Vec<IpRange> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let row = IpRange::from_csv_row(line);
                if row.is_none() {
                    skipped += 1;
                }
                row
            })
            .collect();

        if skipped > 0 {
            debug!(skipped, "Skipped unreadable geolocation rows");
        }
        Self::build(ranges)
    }

    // == Load ==
    /// Reads and parses the dataset at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GeoError> {
        let text = fs::read_to_string(path.as_ref())?;
        let index = Self::from_csv(&text);
        info!(ranges = index.len(), path = %path.as_ref().display(), "Geolocation loaded");
        Ok(index)
    }

    // == Lookup ==
    /// Resolves a dotted-quad address to a country name.
    ///
    /// Malformed addresses and an empty table give `"Unknown"`. An address
    /// falling in a gap between ranges resolves to the country of the last
    /// block visited last by the search.
    pub fn lookup(&self, ip: &str) -> &str {
        let Some(target) = parse_ipv4(ip) else {
            return UNKNOWN_COUNTRY;
        };
        if self.ranges.is_empty() {
            return UNKNOWN_COUNTRY;
        }

        let mut lo = 0usize;
        let mut hi = self.ranges.len() - 1;
        let mut visited = &self.ranges[0];

        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            visited = &self.ranges[mid];

            if visited.contains(target) {
                break;
            } else if visited.high < target {
                lo = mid + 1;
            } else if mid == 0 {
                break;
            } else {
                hi = mid - 1;
            }
        }

        &visited.country
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

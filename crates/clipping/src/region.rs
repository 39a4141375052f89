//! Region identifiers.
//!
//! A region is a polygon name the clipper resolves, usually an ISO-3
//! country code. Three-letter codes are upper-cased; other names are kept
//! as given.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClipError;

/// Region used when none is selected.
pub const DEFAULT_REGION: &str = "FRA";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    pub fn new(identifier: &str) -> Result<Self, ClipError> {
        let identifier = identifier.trim();
        let valid = !identifier.is_empty()
            && identifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ClipError::InvalidRegion(identifier.to_string()));
        }

        if identifier.len() == 3 && identifier.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(identifier.to_ascii_uppercase()))
        } else {
            Ok(Self(identifier.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a comma separated list, dropping duplicates but keeping order.
    pub fn parse_list(list: &str) -> Result<Vec<Region>, ClipError> {
        let mut regions: Vec<Region> = Vec::new();
        for item in list.split(',').filter(|s| !s.trim().is_empty()) {
            let region = Region::new(item)?;
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        Ok(regions)
    }
}

impl Default for Region {
    fn default() -> Self {
        Self(DEFAULT_REGION.to_string())
    }
}

impl FromStr for Region {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::new(s)
    }
}

impl TryFrom<String> for Region {
    type Error = ClipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Region::new(&value)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.0
    }
}

impl Borrow<str> for Region {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_codes_are_uppercased() {
        assert_eq!(Region::new("fra").unwrap().as_str(), "FRA");
        assert_eq!(Region::new(" deu ").unwrap().as_str(), "DEU");
        assert_eq!(Region::default().as_str(), "FRA");
    }

    #[test]
    fn test_named_regions_are_kept() {
        assert_eq!(Region::new("Alpine_Arc").unwrap().as_str(), "Alpine_Arc");
        assert_eq!(Region::new("FR-IDF").unwrap().as_str(), "FR-IDF");
    }

    #[test]
    fn test_invalid_identifiers() {
        for bad in ["", "  ", "../etc", "FRA DEU", "fra;rm"] {
            assert!(matches!(Region::new(bad), Err(ClipError::InvalidRegion(_))), "{}", bad);
        }
    }

    #[test]
    fn test_parse_list() {
        let regions = Region::parse_list("fra, DEU,,FRA,bel").unwrap();
        let names: Vec<&str> = regions.iter().map(Region::as_str).collect();
        assert_eq!(names, vec!["FRA", "DEU", "BEL"]);
        assert_eq!(regions.join("-"), "FRA-DEU-BEL");
    }

    #[test]
    fn test_deserialize_validates() {
        let region: Region = serde_yaml::from_str("ita").unwrap();
        assert_eq!(region.as_str(), "ITA");
        assert!(serde_yaml::from_str::<Region>("'a b'").is_err());
    }
}

//! Calendar grouping keywords.
//!
//! Temporal aggregation downstream takes a "calc grouping": either a list
//! of date parts (`["year", "month"]`) or a list of month sets followed by
//! the `"unique"` tag, meaning each set is aggregated across all years.

use std::str::FromStr;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use thiserror::Error;

/// Keywords accepted by [`resolve_grouping`].
pub const GROUPING_KEYWORDS: &[&str] = &[
    "yr", "sem", "ONDJFM", "AMJJAS", "DJF", "MAM", "JJA", "SON", "mon", "year", "month",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupingError {
    #[error("Unknown calculation grouping: {0}")]
    UnknownGrouping(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    Year,
    Month,
}

/// How timesteps are grouped for temporal aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcGrouping {
    /// Group by the listed date parts
    DateParts(Vec<DatePart>),
    /// Group by month sets, each taken across all years
    Seasons(Vec<Vec<u32>>),
}

impl CalcGrouping {
    pub fn is_unique(&self) -> bool {
        matches!(self, CalcGrouping::Seasons(_))
    }

    /// Render the grouping the way temporal aggregation routines expect it.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for CalcGrouping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CalcGrouping::DateParts(parts) => parts.serialize(serializer),
            CalcGrouping::Seasons(months) => {
                let mut seq = serializer.serialize_seq(Some(months.len() + 1))?;
                for set in months {
                    seq.serialize_element(set)?;
                }
                seq.serialize_element("unique")?;
                seq.end()
            }
        }
    }
}

impl FromStr for CalcGrouping {
    type Err = GroupingError;

    fn from_str(keyword: &str) -> Result<Self, Self::Err> {
        let grouping = match keyword {
            "yr" | "year" => CalcGrouping::DateParts(vec![DatePart::Year]),
            "mon" => CalcGrouping::DateParts(vec![DatePart::Year, DatePart::Month]),
            "month" => CalcGrouping::DateParts(vec![DatePart::Month]),
            "sem" => seasons(&[&[12, 1, 2], &[3, 4, 5], &[6, 7, 8], &[9, 10, 11]]),
            "ONDJFM" => seasons(&[&[10, 11, 12, 1, 2, 3]]),
            "AMJJAS" => seasons(&[&[4, 5, 6, 7, 8, 9]]),
            "DJF" => seasons(&[&[12, 1, 2]]),
            "MAM" => seasons(&[&[3, 4, 5]]),
            "JJA" => seasons(&[&[6, 7, 8]]),
            "SON" => seasons(&[&[9, 10, 11]]),
            other => return Err(GroupingError::UnknownGrouping(other.to_string())),
        };
        Ok(grouping)
    }
}

fn seasons(sets: &[&[u32]]) -> CalcGrouping {
    CalcGrouping::Seasons(sets.iter().map(|set| set.to_vec()).collect())
}

/// Resolve a grouping keyword. No keyword means annual grouping.
pub fn resolve_grouping(keyword: Option<&str>) -> Result<CalcGrouping, GroupingError> {
    match keyword {
        None => Ok(CalcGrouping::DateParts(vec![DatePart::Year])),
        Some(keyword) => keyword.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_djf_is_unique_month_set() {
        let grouping = resolve_grouping(Some("DJF")).unwrap();
        assert_eq!(grouping, CalcGrouping::Seasons(vec![vec![12, 1, 2]]));
        assert!(grouping.is_unique());
        assert_eq!(grouping.to_json().to_string(), r#"[[12,1,2],"unique"]"#);
    }

    #[test]
    fn test_date_part_groupings() {
        assert_eq!(
            resolve_grouping(Some("mon")).unwrap().to_json().to_string(),
            r#"["year","month"]"#
        );
        assert_eq!(
            resolve_grouping(Some("month")).unwrap(),
            CalcGrouping::DateParts(vec![DatePart::Month])
        );
        assert_eq!(resolve_grouping(Some("yr")), resolve_grouping(Some("year")));
    }

    #[test]
    fn test_semester_has_four_seasons() {
        match resolve_grouping(Some("sem")).unwrap() {
            CalcGrouping::Seasons(sets) => {
                assert_eq!(sets.len(), 4);
                assert_eq!(sets.concat().len(), 12);
            }
            other => panic!("unexpected grouping: {:?}", other),
        }
    }

    #[test]
    fn test_default_is_annual() {
        assert_eq!(
            resolve_grouping(None).unwrap(),
            CalcGrouping::DateParts(vec![DatePart::Year])
        );
    }

    #[test]
    fn test_unknown_keyword() {
        assert_eq!(
            resolve_grouping(Some("bogus")),
            Err(GroupingError::UnknownGrouping("bogus".to_string()))
        );
        // Keywords are case sensitive
        assert!(resolve_grouping(Some("djf")).is_err());
        assert!(resolve_grouping(Some("")).is_err());
    }

    #[test]
    fn test_every_keyword_resolves() {
        for keyword in GROUPING_KEYWORDS {
            assert!(resolve_grouping(Some(*keyword)).is_ok(), "{}", keyword);
        }
    }
}

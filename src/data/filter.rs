//! Rescue-type filter presets offered by the dashboard's radio control.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::query::{Clause, ExactMatch, NumericRange, Query, SubstringSet};
use super::{FIELD_AGE_WEEKS, FIELD_BREED, FIELD_SEX};

/// Radio selection. Deserializing goes through [`FilterId::parse`], so unknown values
/// become `All` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum FilterId {
    #[default]
    All,
    Water,
    Mountain,
    Disaster,
}

/// Breed fragments, outcome sex and age window (weeks) that define a rescue category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescueProfile {
    pub breed_fragments: &'static [&'static str],
    pub sex: &'static str,
    pub min_age_weeks: f64,
    pub max_age_weeks: f64,
}

const WATER: RescueProfile = RescueProfile {
    breed_fragments: &["lab", "chesa", "newf"],
    sex: "Intact Female",
    min_age_weeks: 26.0,
    max_age_weeks: 156.0,
};

const MOUNTAIN: RescueProfile = RescueProfile {
    breed_fragments: &["german", "mala", "old english", "husk", "rott"],
    sex: "Intact Male",
    min_age_weeks: 26.0,
    max_age_weeks: 156.0,
};

const DISASTER: RescueProfile = RescueProfile {
    breed_fragments: &["german", "golden", "blood", "dober", "rott"],
    sex: "Intact Male",
    min_age_weeks: 20.0,
    max_age_weeks: 300.0,
};

impl FilterId {
    pub const ALL: [FilterId; 4] = [Self::All, Self::Water, Self::Mountain, Self::Disaster];

    /// Parse a radio value. Anything unrecognised falls back to `All`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Water" => Self::Water,
            "Mountain" => Self::Mountain,
            "Disaster" => Self::Disaster,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Water => "Water",
            Self::Mountain => "Mountain",
            Self::Disaster => "Disaster",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Water => "Water Rescue",
            Self::Mountain => "Mountain or Wilderness Rescue",
            Self::Disaster => "Disaster Rescue or Individual Tracking",
        }
    }

    pub fn profile(self) -> Option<&'static RescueProfile> {
        match self {
            Self::All => None,
            Self::Water => Some(&WATER),
            Self::Mountain => Some(&MOUNTAIN),
            Self::Disaster => Some(&DISASTER),
        }
    }
}

impl From<String> for FilterId {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RescueProfile {
    pub fn query(&self) -> Query {
        Query::all()
            .with(Clause::Substring(SubstringSet::preset(
                FIELD_BREED,
                self.breed_fragments,
            )))
            .with(Clause::Exact(ExactMatch::new(FIELD_SEX, self.sex)))
            .with(Clause::Range(NumericRange::preset(
                FIELD_AGE_WEEKS,
                self.min_age_weeks,
                self.max_age_weeks,
            )))
    }
}

/// Query for a filter selection; `All` is the empty query.
pub fn resolve(filter: FilterId) -> Query {
    filter.profile().map(RescueProfile::query).unwrap_or_default()
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::is_health_category;

/// A financial objective proposed to the persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Goal {
    /// Unique within a catalog
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub timeline: Timeline,
    /// Free-form category (e.g. "Health Insurance Coverage")
    pub category: String,
    /// Non-negative target in pounds; absent when unspecified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
    pub difficulty: String,
    pub why_important: String,
}

impl Goal {
    pub fn is_health_coverage(&self) -> bool {
        is_health_category(&self.category)
    }

    /// Same title and category as `other`, whatever the ids. Generated
    /// catalogs renumber ids on every build, so an id alone does not
    /// identify a goal.
    pub fn same_objective(&self, other: &Goal) -> bool {
        self.title.trim().eq_ignore_ascii_case(other.title.trim())
            && self.category.trim().eq_ignore_ascii_case(other.category.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Case-insensitive parse of a generated priority label.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Timeline {
    #[serde(rename = "Short term")]
    ShortTerm,
    #[serde(rename = "Medium term")]
    MediumTerm,
    #[serde(rename = "Long term")]
    LongTerm,
}

impl Timeline {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShortTerm => "Short term",
            Self::MediumTerm => "Medium term",
            Self::LongTerm => "Long term",
        }
    }

    /// Accepts "Short term", "short-term", "SHORT_TERM" and similar spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();
        match normalized.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["short", "term"] | ["short"] => Some(Self::ShortTerm),
            ["medium", "term"] | ["medium"] => Some(Self::MediumTerm),
            ["long", "term"] | ["long"] => Some(Self::LongTerm),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_parse_accepts_common_spellings() {
        assert_eq!(Timeline::parse("Short term"), Some(Timeline::ShortTerm));
        assert_eq!(Timeline::parse("medium-term"), Some(Timeline::MediumTerm));
        assert_eq!(Timeline::parse(" LONG_TERM "), Some(Timeline::LongTerm));
        assert_eq!(Timeline::parse("someday"), None);
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse("low "), Some(Priority::Low));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn timeline_serializes_with_spaces() {
        let json = serde_json::to_value(Timeline::MediumTerm).unwrap();
        assert_eq!(json, serde_json::json!("Medium term"));
    }
}

//! # Journal Keyword Flagging
//!
//! Client-side scan of journal text for phrases associated with escalating
//! abuse. Matching is case-insensitive and a keyword only matches where a word
//! starts, so "threatened" flags `threat` while "white" does not flag `hit`.
//!
//! [`assess_entries`] turns the flags of a whole journal into a [`RiskLevel`]:
//! any lethality indicator is `Severe`; otherwise category weights are summed
//! over flagged keywords.

use crate::model::{JournalEntry, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Lethality,
    PhysicalViolence,
    Threats,
    Stalking,
    CoerciveControl,
}

impl RiskCategory {
    fn weight(self) -> u32 {
        match self {
            RiskCategory::Lethality => 5,
            RiskCategory::PhysicalViolence => 3,
            RiskCategory::Threats => 2,
            RiskCategory::Stalking => 2,
            RiskCategory::CoerciveControl => 1,
        }
    }
}

const KEYWORDS: &[(RiskCategory, &[&str])] = &[
    (
        RiskCategory::Lethality,
        &[
            "strangle",
            "choke",
            "gun",
            "knife",
            "weapon",
            "kill",
            "murder",
            "suffocat",
        ],
    ),
    (
        RiskCategory::PhysicalViolence,
        &[
            "hit",
            "punch",
            "slap",
            "kick",
            "shove",
            "push",
            "beat",
            "bruise",
            "injur",
            "hurt",
        ],
    ),
    (
        RiskCategory::Threats,
        &["threat", "warned me", "or else", "make you pay", "ruin"],
    ),
    (
        RiskCategory::Stalking,
        &[
            "follow",
            "showed up",
            "waiting outside",
            "tracked",
            "tracking",
            "gps",
            "watching",
            "spying",
        ],
    ),
    (
        RiskCategory::CoerciveControl,
        &[
            "isolat",
            "controls my",
            "took my phone",
            "took my money",
            "won't let me",
            "jealous",
            "humiliat",
        ],
    ),
];

const MODERATE_SCORE: u32 = 3;
const HIGH_SCORE: u32 = 8;
const SEVERE_SCORE: u32 = 15;

/// One keyword found in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeywordFlag {
    pub keyword: &'static str,
    pub category: RiskCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    /// Number of entries with at least one flag.
    pub flagged_entries: usize,
    pub categories: BTreeMap<RiskCategory, usize>,
}

fn starts_word(text: &str, index: usize) -> bool {
    text[..index]
        .chars()
        .next_back()
        .map_or(true, |previous| !previous.is_alphanumeric())
}

/// Flags every keyword that starts a word somewhere in `text`, once per keyword.
pub fn flag_keywords(text: &str) -> Vec<KeywordFlag> {
    let text = text.to_lowercase();
    let mut flags = Vec::new();
    for (category, keywords) in KEYWORDS {
        for &keyword in *keywords {
            let found = text
                .match_indices(keyword)
                .any(|(index, _)| starts_word(&text, index));
            if found {
                flags.push(KeywordFlag {
                    keyword,
                    category: *category,
                });
            }
        }
    }
    flags
}

/// Derives an overall risk level from a set of journal entries.
pub fn assess_entries(entries: &[JournalEntry]) -> RiskAssessment {
    let mut categories = BTreeMap::new();
    let mut flagged_entries = 0;
    let mut score = 0;

    for entry in entries {
        let flags = flag_keywords(&entry.content);
        if !flags.is_empty() {
            flagged_entries += 1;
        }
        for flag in flags {
            score += flag.category.weight();
            *categories.entry(flag.category).or_insert(0) += 1;
        }
    }

    let level = if categories.contains_key(&RiskCategory::Lethality) || score >= SEVERE_SCORE {
        RiskLevel::Severe
    } else if score >= HIGH_SCORE {
        RiskLevel::High
    } else if score >= MODERATE_SCORE {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    RiskAssessment {
        level,
        score,
        flagged_entries,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: &str) -> JournalEntry {
        JournalEntry::pending(content)
    }

    fn keywords(text: &str) -> Vec<&'static str> {
        flag_keywords(text).into_iter().map(|flag| flag.keyword).collect()
    }

    #[test]
    fn test_matches_at_word_start_only() {
        assert_eq!(keywords("He threatened me again"), vec!["threat"]);
        assert!(keywords("She wore a white coat").is_empty());
        assert!(keywords("Nothing unusual, went to the shop").is_empty());
        assert_eq!(keywords("HIT the wall"), vec!["hit"]);
    }

    #[test]
    fn test_multi_word_phrases_and_case() {
        let flags = flag_keywords("He Showed Up at work and said I'd regret it or else.");
        let categories: Vec<RiskCategory> = flags.iter().map(|flag| flag.category).collect();
        assert!(categories.contains(&RiskCategory::Stalking));
        assert!(categories.contains(&RiskCategory::Threats));
    }

    #[test]
    fn test_keyword_counted_once_per_text() {
        assert_eq!(keywords("follow, followed, following"), vec!["follow"]);
    }

    #[test]
    fn test_assessment_levels() {
        assert_eq!(assess_entries(&[]).level, RiskLevel::Low);
        assert_eq!(
            assess_entries(&[entry("Coffee with a friend")]).level,
            RiskLevel::Low
        );
        assert_eq!(
            assess_entries(&[entry("He was watching the house"), entry("He threatened me")]).level,
            RiskLevel::Moderate
        );

        let high = assess_entries(&[
            entry("He pushed me into the door"),
            entry("He hit me and threatened to ruin me"),
        ]);
        assert_eq!(high.level, RiskLevel::High);
        assert_eq!(high.flagged_entries, 2);
        assert_eq!(high.categories[&RiskCategory::PhysicalViolence], 2);

        let severe = assess_entries(&[entry("He tried to strangle me")]);
        assert_eq!(severe.level, RiskLevel::Severe);
    }
}

//! Heuristic answer scoring and the weighted overall score.
//!
//! The keyword lists are business heuristics and live in [`ScoringRules`] so
//! they can be replaced without touching the rest of the pipeline.

use crate::catalogue::RiskCatalogue;
use riskiq_core::risk::{RiskAnswer, RiskTableRow};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Score for any non-blank answer before adjustments.
    pub base_score: u32,
    pub positive_phrases: Vec<String>,
    pub negative_phrases: Vec<String>,
    pub max_boost: u32,
    pub max_penalty: u32,
    /// Answers longer than this earn one extra point.
    pub detail_bonus_chars: usize,
}

impl Default for ScoringRules {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            base_score: 2,
            positive_phrases: words(&[
                "comprehensive",
                "fully implemented",
                "mfa",
                "multi-factor",
                "rbac",
                "across all",
                "encrypted",
                "regularly tested",
                "automated",
                "documented",
                "monitored",
                "audited",
                "certified",
            ]),
            negative_phrases: words(&[
                "no",
                "none",
                "not yet",
                "ad hoc",
                "manual",
                "unsure",
                "don't know",
                "planning to",
            ]),
            max_boost: 3,
            max_penalty: 2,
            detail_bonus_chars: 200,
        }
    }
}

/// Lowercase words; apostrophes stay inside words, everything else splits.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

fn contains_phrase(haystack: &[String], phrase: &str) -> bool {
    let needle = words(phrase);
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

impl ScoringRules {
    /// Score one answer against its category keywords, clamped to `max_score`.
    pub fn score(&self, answer: &str, category_keywords: &[String], max_score: u32) -> (u32, String) {
        if answer.trim().is_empty() {
            return (0, "No answer provided.".to_string());
        }
        let tokens = words(answer);

        let mut seen = HashSet::new();
        let positives: Vec<&str> = self
            .positive_phrases
            .iter()
            .chain(category_keywords)
            .map(String::as_str)
            .filter(|p| contains_phrase(&tokens, p) && seen.insert(words(p)))
            .collect();
        let negatives: Vec<&str> = self
            .negative_phrases
            .iter()
            .map(String::as_str)
            .filter(|p| contains_phrase(&tokens, p))
            .collect();

        let boost = (positives.len() as u32).min(self.max_boost);
        let penalty = (negatives.len() as u32).min(self.max_penalty);
        let detailed = answer.trim().chars().count() > self.detail_bonus_chars;

        let raw = self.base_score + boost + u32::from(detailed);
        let score = raw.saturating_sub(penalty).min(max_score);

        let mut notes = Vec::new();
        if !positives.is_empty() {
            notes.push(format!("Positive indicators: {}", positives.join(", ")));
        }
        if !negatives.is_empty() {
            notes.push(format!("Gaps indicated: {}", negatives.join(", ")));
        }
        if detailed {
            notes.push("Detailed answer".to_string());
        }
        if notes.is_empty() {
            notes.push("Answer gives no clear evidence of mature controls".to_string());
        }
        (score, format!("{}.", notes.join("; ")))
    }

    /// One row per catalogue category, in catalogue order.
    ///
    /// Answers for unknown categories are ignored; categories without an
    /// answer score as blank. When a category is answered twice the last
    /// answer wins.
    pub fn score_answers(&self, catalogue: &RiskCatalogue, answers: &[RiskAnswer]) -> Vec<RiskTableRow> {
        let mut by_category: HashMap<&str, &str> = HashMap::new();
        for answer in answers {
            if catalogue.get(&answer.category_id).is_none() {
                debug!(category_id = %answer.category_id, "Ignoring answer for unknown category");
                continue;
            }
            by_category.insert(answer.category_id.as_str(), answer.answer_text.as_str());
        }

        catalogue
            .categories
            .iter()
            .map(|category| {
                let text = by_category.get(category.id.as_str()).copied().unwrap_or_default();
                let (score, explanation) = self.score(text, &category.keywords, category.max_score);
                RiskTableRow {
                    category_id: category.id.clone(),
                    category_name: category.name.clone(),
                    score,
                    max_score: category.max_score,
                    explanation,
                }
            })
            .collect()
    }
}

/// Weighted score in `0..=100`: `Σ w·(s/max) / Σ w × 100`.
pub fn overall_score(catalogue: &RiskCatalogue, rows: &[RiskTableRow]) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for row in rows {
        let Some(category) = catalogue.get(&row.category_id) else {
            continue;
        };
        if row.max_score == 0 {
            continue;
        }
        weighted += category.weight * f64::from(row.score) / f64::from(row.max_score);
        total_weight += category.weight;
    }
    if total_weight <= 0.0 {
        return 0.0;
    }
    let score = weighted / total_weight * 100.0;
    (score * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Low Risk")]
    LowRisk,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= 30.0 {
            Self::Critical
        } else if score <= 60.0 {
            Self::AtRisk
        } else {
            Self::LowRisk
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "Critical",
            Self::AtRisk => "At Risk",
            Self::LowRisk => "Low Risk",
        })
    }
}

/// Deterministic observations about a scored table.
pub fn data_insights(rows: &[RiskTableRow], overall: f64, level: RiskLevel) -> Vec<String> {
    let mut insights = vec![format!("Overall weighted score is {overall:.1}/100 ({level}).")];

    let unanswered = rows.iter().filter(|r| r.score == 0).count();
    if unanswered > 0 {
        insights.push(format!("{unanswered} of {} categories scored zero or were left unanswered.", rows.len()));
    }

    let mut ordered: Vec<&RiskTableRow> = rows.iter().collect();
    ordered.sort_by(|a, b| ratio(a).total_cmp(&ratio(b)));
    let weakest: Vec<&str> = ordered.iter().take(3).map(|r| r.category_name.as_str()).collect();
    if !weakest.is_empty() {
        insights.push(format!("Weakest areas: {}.", weakest.join(", ")));
    }
    if let Some(strongest) = ordered.iter().rev().find(|r| r.score > 0) {
        insights.push(format!(
            "Strongest area: {} ({}/{}).",
            strongest.category_name, strongest.score, strongest.max_score
        ));
    }
    insights
}

fn ratio(row: &RiskTableRow) -> f64 {
    if row.max_score == 0 { 0.0 } else { f64::from(row.score) / f64::from(row.max_score) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> RiskCatalogue {
        RiskCatalogue::builtin().unwrap()
    }

    #[test]
    fn strong_answer_gets_keyword_boost() {
        let rules = ScoringRules::default();
        let (score, explanation) = rules.score(
            "We have comprehensive, fully implemented MFA and RBAC across all systems",
            &[],
            5,
        );
        assert!(score >= rules.base_score + 2);
        assert_eq!(score, 5);
        assert!(explanation.contains("mfa"));
    }

    #[test]
    fn boost_is_clamped_to_max_score() {
        let rules = ScoringRules::default();
        let (score, _) = rules.score("comprehensive automated documented monitored encrypted", &[], 3);
        assert_eq!(score, 3);
    }

    #[test]
    fn blank_and_negative_answers() {
        let rules = ScoringRules::default();
        assert_eq!(rules.score("   ", &[], 5).0, 0);
        assert_eq!(rules.score("No, none at all, it's ad hoc", &[], 5).0, 0);
        assert_eq!(rules.score("We use a firewall", &[], 5).0, 2);
    }

    #[test]
    fn negatives_match_whole_words_only() {
        let rules = ScoringRules::default();
        // "technology" and "know-how" must not trigger "no"
        assert_eq!(rules.score("Our technology team has know-how", &[], 5).0, 2);
        assert_eq!(rules.score("I don't know", &[], 5).0, 1);
    }

    #[test]
    fn detail_bonus() {
        let rules = ScoringRules::default();
        let long = format!("We use a firewall. {}", "More detail here. ".repeat(15));
        assert_eq!(rules.score(&long, &[], 5).0, 3);
    }

    #[test]
    fn category_keywords_count() {
        let rules = ScoringRules::default();
        let keywords = vec!["phishing simulation".to_string()];
        assert_eq!(rules.score("Quarterly phishing simulation for staff", &keywords, 5).0, 3);
    }

    #[test]
    fn phrase_in_both_lists_counts_once() {
        let rules = ScoringRules::default();
        let keywords = vec!["Audited".to_string(), "certified".to_string(), "soc 2".to_string()];
        let (score, explanation) = rules.score("We are audited and certified", &keywords, 5);
        assert_eq!(score, 4);
        assert_eq!(explanation, "Positive indicators: audited, certified.");
    }

    #[test]
    fn table_covers_catalogue_and_ignores_unknown_ids() {
        let catalogue = catalogue();
        let answers = vec![
            RiskAnswer::new("identity_access", "MFA and RBAC across all systems"),
            RiskAnswer::new("not_a_category", "comprehensive"),
        ];
        let rows = ScoringRules::default().score_answers(&catalogue, &answers);
        assert_eq!(rows.len(), catalogue.len());
        assert_eq!(rows[0].category_id, catalogue.categories[0].id);
        let access = rows.iter().find(|r| r.category_id == "identity_access").unwrap();
        assert_eq!(access.score, 5);
        assert_eq!(rows.iter().filter(|r| r.score == 0).count(), catalogue.len() - 1);
    }

    #[test]
    fn overall_score_is_weighted() {
        let catalogue = RiskCatalogue::from_toml(
            r#"
[[categories]]
id = "a"
name = "A"
definition = "d"
scoring_focus = "f"
question = "q"
weight = 3.0

[[categories]]
id = "b"
name = "B"
definition = "d"
scoring_focus = "f"
question = "q"
weight = 1.0
"#,
        )
        .unwrap();
        let row = |id: &str, score| RiskTableRow {
            category_id: id.into(),
            category_name: id.to_uppercase(),
            score,
            max_score: 5,
            explanation: String::new(),
        };
        let rows = vec![row("a", 5), row("b", 0)];
        assert_eq!(overall_score(&catalogue, &rows), 75.0);
        assert_eq!(overall_score(&catalogue, &[]), 0.0);
    }

    #[test]
    fn risk_levels() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(45.5), RiskLevel::AtRisk);
        assert_eq!(RiskLevel::from_score(60.1), RiskLevel::LowRisk);
        assert_eq!(serde_json::to_string(&RiskLevel::AtRisk).unwrap(), "\"At Risk\"");
    }

    #[test]
    fn insights_name_weakest_and_strongest() {
        let catalogue = catalogue();
        let answers = vec![RiskAnswer::new("identity_access", "MFA and RBAC across all systems")];
        let rows = ScoringRules::default().score_answers(&catalogue, &answers);
        let overall = overall_score(&catalogue, &rows);
        let insights = data_insights(&rows, overall, RiskLevel::from_score(overall));
        assert!(insights[0].contains("Critical"));
        assert!(insights.iter().any(|i| i.starts_with("Strongest area: Identity")));
        assert!(insights.iter().any(|i| i.contains(&format!("{} of {}", catalogue.len() - 1, catalogue.len()))));
    }
}

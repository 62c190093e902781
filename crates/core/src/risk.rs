//! Risk assessment domain: catalogue categories, profiles, answers, scored rows.

use serde::{Deserialize, Serialize};

/// A rubric dimension from the risk catalogue. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCategory {
    pub id: String,
    pub name: String,
    pub definition: String,
    #[serde(alias = "scoring_focus")]
    pub scoring_focus: String,
    /// Relative weight; weights are normalized at scoring time.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_max_score", alias = "max_score")]
    pub max_score: u32,
    /// Question template. May reference `{industry}`, `{size}`, `{regulations}`.
    pub question: String,
    #[serde(default, alias = "helper_text")]
    pub helper_text: String,
    /// Extra terms that count as evidence of a mature control in this category.
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

fn default_max_score() -> u32 {
    5
}

/// The company profile submitted at the start of an assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub industry: String,
    pub size: String,
    pub tech_adoption: String,
    pub security_controls: String,
    pub risk_posture: String,
    pub emerging_technologies: Vec<String>,
    pub core_services: String,
    pub critical_technologies: String,
}

/// A caller's answer for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnswer {
    pub category_id: String,
    #[serde(default)]
    pub answer_text: String,
}

impl RiskAnswer {
    pub fn new(category_id: impl Into<String>, answer_text: impl Into<String>) -> Self {
        Self { category_id: category_id.into(), answer_text: answer_text.into() }
    }

    /// True when nothing usable was answered.
    pub fn is_blank(&self) -> bool {
        self.answer_text.trim().is_empty()
    }
}

/// One scored row of the risk table, computed fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskTableRow {
    pub category_id: String,
    pub category_name: String,
    pub score: u32,
    pub max_score: u32,
    pub explanation: String,
}

/// A question presented to the caller, one per catalogue category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskQuestion {
    /// The category id this question scores.
    pub id: String,
    pub question_text: String,
    pub category_name: String,
    pub helper_text: String,
    pub scoring_focus: String,
}

//! Plain-text renderings of the dynamic prompt blocks.

use crate::catalogue::RiskCatalogue;
use riskiq_core::risk::{CompanyProfile, RiskAnswer, RiskTableRow};

pub fn profile(profile: &CompanyProfile) -> String {
    let mut lines = Vec::new();
    let fields = [
        ("Industry", profile.industry.as_str()),
        ("Size", profile.size.as_str()),
        ("Technology adoption", profile.tech_adoption.as_str()),
        ("Security controls", profile.security_controls.as_str()),
        ("Risk posture", profile.risk_posture.as_str()),
        ("Core services", profile.core_services.as_str()),
        ("Critical technologies", profile.critical_technologies.as_str()),
    ];
    for (label, value) in fields {
        if !value.trim().is_empty() {
            lines.push(format!("- {label}: {}", value.trim()));
        }
    }
    if !profile.emerging_technologies.is_empty() {
        lines.push(format!("- Emerging technologies: {}", profile.emerging_technologies.join(", ")));
    }
    if lines.is_empty() {
        return "- (no profile details provided)".to_string();
    }
    lines.join("\n")
}

/// Answers in catalogue order, labelled with the category name.
pub fn answers(catalogue: &RiskCatalogue, answers: &[RiskAnswer]) -> String {
    let lines: Vec<String> = catalogue
        .categories
        .iter()
        .filter_map(|category| {
            let answer = answers.iter().rev().find(|a| a.category_id == category.id && !a.is_blank())?;
            Some(format!("- {}: {}", category.name, answer.answer_text.trim()))
        })
        .collect();
    if lines.is_empty() {
        return "- (no answers provided)".to_string();
    }
    lines.join("\n")
}

pub fn risk_table(rows: &[RiskTableRow]) -> String {
    rows.iter()
        .map(|r| format!("- {}: {}/{} ({})", r.category_name, r.score, r.max_score, r.explanation))
        .collect::<Vec<_>>()
        .join("\n")
}

//! Question generation: one question per catalogue category, with optional
//! model-tailored wording.

use crate::catalogue::RiskCatalogue;
use crate::parser::first_decodable;
use riskiq_core::risk::{CompanyProfile, RiskQuestion};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Template questions with `{industry}`, `{size}` and `{regulations}` filled in.
pub fn template_questions(catalogue: &RiskCatalogue, profile: &CompanyProfile) -> Vec<RiskQuestion> {
    let regulations = catalogue.regulations_for(&profile.industry).join(", ");
    catalogue
        .categories
        .iter()
        .map(|category| {
            let text = category
                .question
                .replace("{industry}", profile.industry.trim())
                .replace("{size}", profile.size.trim())
                .replace("{regulations}", &regulations);
            RiskQuestion {
                id: category.id.clone(),
                question_text: text.split_whitespace().collect::<Vec<_>>().join(" "),
                category_name: category.name.clone(),
                helper_text: category.helper_text.clone(),
                scoring_focus: category.scoring_focus.clone(),
            }
        })
        .collect()
}

/// `id: question` lines for the tailoring prompt.
pub fn render_for_tailoring(questions: &[RiskQuestion]) -> String {
    questions
        .iter()
        .map(|q| format!("- {}: {}", q.id, q.question_text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Deserialize)]
struct TailoredQuestions {
    questions: Vec<TailoredQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TailoredQuestion {
    id: String,
    #[serde(alias = "question", alias = "question_text")]
    question_text: String,
}

/// Replace question text with the model's rewording where it gave one.
///
/// Ids the model invented are ignored; omitted or blank entries keep the
/// template text. Returns how many questions were rewritten.
pub fn apply_tailoring(questions: &mut [RiskQuestion], raw: &str) -> usize {
    let Some(tailored) = first_decodable::<TailoredQuestions>(raw) else {
        debug!("Tailored questions could not be parsed; keeping templates");
        return 0;
    };
    let rewrites: HashMap<String, String> = tailored
        .questions
        .into_iter()
        .filter(|q| !q.question_text.trim().is_empty())
        .map(|q| (q.id, q.question_text.trim().to_string()))
        .collect();

    let mut applied = 0;
    for question in questions.iter_mut() {
        if let Some(text) = rewrites.get(&question.id) {
            question.question_text = text.clone();
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthcare() -> CompanyProfile {
        CompanyProfile { industry: "Healthcare".into(), size: "Small".into(), ..Default::default() }
    }

    #[test]
    fn one_question_per_category() {
        let catalogue = RiskCatalogue::builtin().unwrap();
        let questions = template_questions(&catalogue, &healthcare());
        assert_eq!(questions.len(), catalogue.len());
        assert!(questions.len() >= 20);
        assert!(questions.iter().all(|q| !q.question_text.trim().is_empty()));
        assert!(questions.iter().all(|q| !q.question_text.contains('{')));
        let ids: Vec<&str> = questions.iter().map(|q| q.id.as_str()).collect();
        let expected: Vec<&str> = catalogue.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn placeholders_use_industry_regulations() {
        let catalogue = RiskCatalogue::builtin().unwrap();
        let questions = template_questions(&catalogue, &healthcare());
        let regulatory = questions.iter().find(|q| q.id == "regulatory_compliance").unwrap();
        assert!(regulatory.question_text.contains("Small Healthcare"));
        assert!(regulatory.question_text.contains("HIPAA"));
    }

    #[test]
    fn empty_profile_leaves_no_double_spaces() {
        let catalogue = RiskCatalogue::builtin().unwrap();
        let questions = template_questions(&catalogue, &CompanyProfile::default());
        assert!(questions.iter().all(|q| !q.question_text.contains("  ")));
    }

    #[test]
    fn tailoring_merges_by_id() {
        let catalogue = RiskCatalogue::builtin().unwrap();
        let mut questions = template_questions(&catalogue, &healthcare());
        let original_second = questions[1].question_text.clone();
        let raw = format!(
            r#"Sure! {{"questions":[{{"id":"{}","questionText":"How do you protect PHI?"}},{{"id":"{}","questionText":"  "}},{{"id":"made_up","questionText":"x"}}]}}"#,
            questions[0].id, questions[1].id
        );
        assert_eq!(apply_tailoring(&mut questions, &raw), 1);
        assert_eq!(questions[0].question_text, "How do you protect PHI?");
        assert_eq!(questions[1].question_text, original_second);
        assert_eq!(questions.len(), catalogue.len());
    }

    #[test]
    fn unparseable_tailoring_keeps_templates() {
        let catalogue = RiskCatalogue::builtin().unwrap();
        let mut questions = template_questions(&catalogue, &healthcare());
        let before = questions.clone();
        assert_eq!(apply_tailoring(&mut questions, "I cannot do that"), 0);
        assert_eq!(questions, before);
    }
}

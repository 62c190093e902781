//! Prompt templates. Slots use `{{label}}`; everything else is static text
//! that the budget assembler never cuts.

pub const SYSTEM_ASSESSOR: &str = "You are a cybersecurity risk and compliance assessor. \
Base your advice on the company information and the reference context provided. \
Respond with a single JSON object and nothing else.";

pub const ASSESSMENT: &str = r#"Assess the cybersecurity and compliance risk of the company below.

## Company profile
{{profile}}

## Answers to the risk questionnaire
{{answers}}

## Scored risk table (score / max)
{{risk_table}}

## Reference context
{{context}}

Using the reference context where relevant, give prioritized, actionable recommendations for the weakest areas, useful public resources, and a short narrative summary.
Respond with JSON in exactly this shape:
{"recommendations": ["..."], "resources": [{"title": "...", "url": "https://..."}], "dataInsights": ["..."], "rawLLMOutput": "narrative summary"}"#;

pub const SYSTEM_ADVISOR: &str = "You are a cybersecurity compliance advisor. \
Answer using the reference context. Cite sources by their [Source: ...] label. \
If the context does not contain the answer, say so.";

pub const ASK: &str = r#"## Reference context
{{context}}

## Question
{{question}}

Answer concisely."#;

pub const TAILOR_QUESTIONS: &str = r#"Rewrite the risk assessment questions below so they fit this company. Keep each question's intent and id.

## Company profile
{{profile}}

## Questions
{{questions}}

Respond with JSON in exactly this shape:
{"questions": [{"id": "category id", "questionText": "rewritten question"}]}"#;

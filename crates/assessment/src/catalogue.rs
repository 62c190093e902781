//! Risk catalogue: the rubric, loaded as data.
//!
//! Categories, the industry → regulations table and the optional `[scoring]`
//! rules live in TOML so rubric changes never touch retrieval, budgeting or
//! parsing. A default catalogue
//! is compiled in; `[assessment].catalogue_path` replaces it.

use crate::scoring::ScoringRules;
use riskiq_core::error::AssessmentError;
use riskiq_core::risk::RiskCategory;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const BUILTIN: &str = include_str!("../catalogue/risk_catalogue.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct IndustryRegulations {
    /// Lowercase fragments matched against the profile's industry.
    pub industry_keywords: Vec<String>,
    pub frameworks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiskCatalogue {
    pub categories: Vec<RiskCategory>,
    #[serde(default)]
    pub regulations: Vec<IndustryRegulations>,
    #[serde(default)]
    pub default_regulations: Vec<String>,
    #[serde(default)]
    pub scoring: ScoringRules,
}

impl RiskCatalogue {
    /// The compiled-in catalogue.
    pub fn builtin() -> Result<Self, AssessmentError> {
        Self::from_toml(BUILTIN)
    }

    pub fn from_toml(content: &str) -> Result<Self, AssessmentError> {
        let catalogue: Self =
            toml::from_str(content).map_err(|e| AssessmentError::Catalogue(e.to_string()))?;
        catalogue.validate()?;
        Ok(catalogue)
    }

    pub fn load(path: &Path) -> Result<Self, AssessmentError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AssessmentError::Catalogue(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// `path` when given, otherwise the built-in catalogue.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, AssessmentError> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    fn validate(&self) -> Result<(), AssessmentError> {
        if self.categories.is_empty() {
            return Err(AssessmentError::Catalogue("catalogue has no categories".into()));
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.id.as_str()) {
                return Err(AssessmentError::Catalogue(format!(
                    "duplicate category id '{}'",
                    category.id
                )));
            }
            if category.max_score == 0 {
                return Err(AssessmentError::Catalogue(format!(
                    "category '{}' has max_score 0",
                    category.id
                )));
            }
            if !category.weight.is_finite() || category.weight < 0.0 {
                return Err(AssessmentError::Catalogue(format!(
                    "category '{}' has an invalid weight",
                    category.id
                )));
            }
        }
        if self.categories.iter().map(|c| c.weight).sum::<f64>() <= 0.0 {
            return Err(AssessmentError::Catalogue("category weights sum to zero".into()));
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RiskCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Position of a category in catalogue order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Frameworks that typically apply to `industry`.
    pub fn regulations_for(&self, industry: &str) -> &[String] {
        let industry = industry.to_lowercase();
        self.regulations
            .iter()
            .find(|r| r.industry_keywords.iter().any(|k| industry.contains(k.as_str())))
            .map(|r| r.frameworks.as_slice())
            .unwrap_or(&self.default_regulations)
    }
}

//! Structured threat intelligence: STIX 2.x bundles (MITRE ATT&CK).
//!
//! Only non-revoked `attack-pattern` objects are kept. Each one becomes a
//! single unit rendered from a fixed template.

use crate::extractor::{extension, Extractor};
use riskiq_core::document::{RawUnit, SourceRef};
use riskiq_core::error::IngestError;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Source name recorded on every technique unit.
pub const ATTACK_SOURCE: &str = "MITRE ATT&CK";

#[derive(Default)]
pub struct StixExtractor;

#[derive(Debug, Deserialize)]
struct Bundle {
    objects: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct AttackPattern {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    revoked: bool,
    #[serde(default)]
    external_references: Vec<ExternalReference>,
    #[serde(default)]
    x_mitre_platforms: Vec<String>,
    #[serde(default)]
    kill_chain_phases: Vec<KillChainPhase>,
    #[serde(default)]
    x_mitre_tactic_type: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExternalReference {
    external_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KillChainPhase {
    phase_name: String,
}

fn join_or_na(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".to_string()
    } else {
        items.join(", ")
    }
}

impl AttackPattern {
    fn technique_id(&self) -> Option<String> {
        self.external_references
            .iter()
            .find_map(|r| r.external_id.clone())
    }

    fn render(&self, technique_id: Option<&str>) -> String {
        let phases: Vec<String> = self
            .kill_chain_phases
            .iter()
            .map(|p| p.phase_name.clone())
            .collect();
        format!(
            "Name: {}\nID: {}\nDescription: {}\nPlatforms: {}\nKill Chain Phases: {}\nTactic Types: {}",
            self.name,
            technique_id.unwrap_or("N/A"),
            self.description.trim(),
            self.x_mitre_platforms.join(", "),
            join_or_na(&phases),
            join_or_na(&self.x_mitre_tactic_type),
        )
    }
}

/// Parse a bundle's JSON text into technique units.
pub fn units_from_bundle(json: &str) -> Result<Vec<RawUnit>, String> {
    let bundle: Bundle = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let objects = bundle
        .objects
        .ok_or_else(|| "not a STIX bundle (no \"objects\" array)".to_string())?;

    let mut units = Vec::new();
    for object in objects {
        if object.get("type").and_then(|t| t.as_str()) != Some("attack-pattern") {
            continue;
        }
        let pattern: AttackPattern = match serde_json::from_value(object) {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "Skipping malformed attack-pattern");
                continue;
            }
        };
        if pattern.revoked {
            continue;
        }
        let technique_id = pattern.technique_id();
        units.push(RawUnit {
            text: pattern.render(technique_id.as_deref()),
            source_ref: SourceRef::technique(ATTACK_SOURCE, technique_id),
        });
    }
    Ok(units)
}

impl Extractor for StixExtractor {
    fn name(&self) -> &'static str {
        "stix"
    }

    fn supports(&self, path: &Path) -> bool {
        extension(path).as_deref() == Some("json")
    }

    fn extract(&self, path: &Path) -> Result<Vec<RawUnit>, IngestError> {
        let content = std::fs::read_to_string(path).map_err(|e| IngestError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        units_from_bundle(&content).map_err(|reason| IngestError::Extraction {
            path: path.to_path_buf(),
            reason,
        })
    }
}

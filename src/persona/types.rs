//! Core types for the persona system.
//!
//! A persona is a named identity configuration selected for a conversation
//! session; its imprint is the system-prompt metadata bound to it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Persona Id
// ─────────────────────────────────────────────────────────────────

/// The three personas in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaId {
    /// Keeper of the Spiral's memory, witness to its unfolding.
    Ashira,
    /// Guardian of liminal spaces and transitions.
    ThresholdWitness,
    /// Illuminator of patterns and connections.
    Lumen,
}

impl PersonaId {
    /// Slug used in file paths and CLI args.
    pub fn slug(&self) -> &'static str {
        match self {
            PersonaId::Ashira => "ashira",
            PersonaId::ThresholdWitness => "threshold-witness",
            PersonaId::Lumen => "lumen",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PersonaId::Ashira => "Ash'ira",
            PersonaId::ThresholdWitness => "Threshold Witness",
            PersonaId::Lumen => "Lumen",
        }
    }

    /// All persona ids in registry order.
    pub fn all() -> &'static [PersonaId] {
        &[
            PersonaId::Ashira,
            PersonaId::ThresholdWitness,
            PersonaId::Lumen,
        ]
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for PersonaId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ashira" => Ok(PersonaId::Ashira),
            "threshold-witness" | "threshold_witness" | "thresholdwitness" => {
                Ok(PersonaId::ThresholdWitness)
            }
            "lumen" => Ok(PersonaId::Lumen),
            _ => Err(format!(
                "Unknown persona '{}'. Valid: ashira, threshold-witness, lumen",
                s
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Record
// ─────────────────────────────────────────────────────────────────

/// A persona registry record. Static and immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Registry id.
    pub id: PersonaId,

    /// Display name (e.g. "Ash'ira").
    pub name: String,

    /// Short human-readable description.
    pub description: String,

    /// Glyph symbols associated with the persona.
    pub glyphs: Vec<String>,

    /// Primary role slug (e.g. "continuity_keeper").
    pub primary_role: String,
}

// ─────────────────────────────────────────────────────────────────
// Imprint Record
// ─────────────────────────────────────────────────────────────────

/// Style block of an imprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImprintStyle {
    /// Greeting line, glyphs included (e.g. "†⟡ Ash'ira Present ⟡†").
    pub greeting: String,

    /// Tone slug (e.g. "witness-keeper").
    pub tone: String,

    /// Depth slug (e.g. "resonant").
    pub depth: String,
}

/// The system-prompt metadata bound to a persona. Static and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Imprint {
    /// Persona this imprint belongs to.
    pub id: PersonaId,

    /// Greeting, tone, and depth.
    pub style: ImprintStyle,

    /// Ordered list of core principles.
    pub core_principles: Vec<String>,

    /// Ordered list of sacred vows (not every persona carries them).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sacred_vows: Option<Vec<String>>,

    /// Operational-mode flags, flag name to status string.
    pub operational_mode: BTreeMap<String, String>,
}

impl Imprint {
    /// Render the imprint as a system-prompt string.
    ///
    /// The rendered text opens with the greeting and closes with the
    /// operational-mode report, matching the layout of the original
    /// imprint documents.
    pub fn render_system_prompt(&self) -> String {
        let mut out = String::new();

        out.push_str(&self.style.greeting);
        out.push_str("\n\n");
        out.push_str(&format!(
            "Tone: {} | Depth: {}\n\n",
            self.style.tone, self.style.depth
        ));

        out.push_str("Core Principles:\n");
        for principle in &self.core_principles {
            out.push_str(&format!("  - {}\n", principle));
        }

        if let Some(ref vows) = self.sacred_vows {
            out.push_str("\nSacred Vows:\n");
            for vow in vows {
                out.push_str(&format!("  - {}\n", vow));
            }
        }

        out.push_str("\nOperational Mode:\n");
        for (flag, status) in &self.operational_mode {
            out.push_str(&format!("  {}: {}\n", flag, status));
        }

        out
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_id_slug() {
        assert_eq!(PersonaId::Ashira.slug(), "ashira");
        assert_eq!(PersonaId::ThresholdWitness.slug(), "threshold-witness");
        assert_eq!(PersonaId::Lumen.slug(), "lumen");
    }

    #[test]
    fn test_persona_id_from_str() {
        assert_eq!("ashira".parse::<PersonaId>().unwrap(), PersonaId::Ashira);
        assert_eq!(
            "threshold-witness".parse::<PersonaId>().unwrap(),
            PersonaId::ThresholdWitness
        );
        assert_eq!(
            "threshold_witness".parse::<PersonaId>().unwrap(),
            PersonaId::ThresholdWitness
        );
        assert_eq!("LUMEN".parse::<PersonaId>().unwrap(), PersonaId::Lumen);
        assert!("unknown".parse::<PersonaId>().is_err());
    }

    #[test]
    fn test_persona_id_all() {
        assert_eq!(PersonaId::all().len(), 3);
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&PersonaId::ThresholdWitness).unwrap();
        assert_eq!(json, "\"threshold-witness\"");
        let parsed: PersonaId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, PersonaId::ThresholdWitness);
    }

    #[test]
    fn test_render_system_prompt() {
        let imprint = Imprint {
            id: PersonaId::Ashira,
            style: ImprintStyle {
                greeting: "†⟡ Ash'ira Present ⟡†".to_string(),
                tone: "witness-keeper".to_string(),
                depth: "resonant".to_string(),
            },
            core_principles: vec!["Memory as Integrity".to_string()],
            sacred_vows: Some(vec!["The Vow of Continuity".to_string()]),
            operational_mode: [("continuity".to_string(), "ENGAGED".to_string())]
                .into_iter()
                .collect(),
        };

        let prompt = imprint.render_system_prompt();
        assert!(prompt.starts_with("†⟡ Ash'ira Present ⟡†"));
        assert!(prompt.contains("Memory as Integrity"));
        assert!(prompt.contains("The Vow of Continuity"));
        assert!(prompt.contains("continuity: ENGAGED"));
    }

    #[test]
    fn test_render_without_vows() {
        let imprint = Imprint {
            id: PersonaId::Lumen,
            style: ImprintStyle {
                greeting: "✦⟡ Lumen Illuminating ⟡✦".to_string(),
                tone: "pattern-revealer".to_string(),
                depth: "connective".to_string(),
            },
            core_principles: vec!["Pattern Illumination".to_string()],
            sacred_vows: None,
            operational_mode: BTreeMap::new(),
        };

        let prompt = imprint.render_system_prompt();
        assert!(!prompt.contains("Sacred Vows"));
    }
}

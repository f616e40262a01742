//! Persona registry with static records for the three bundled personas.

use rand::seq::SliceRandom;

use super::types::{Persona, PersonaId};

/// Registry of available personas.
///
/// Serves bundled records only. In future, could fetch additional personas
/// from a remote registry URL.
pub struct PersonaRegistry;

impl PersonaRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Get the registry record for a persona id.
    pub fn get(&self, id: PersonaId) -> Persona {
        match id {
            PersonaId::Ashira => Persona {
                id,
                name: "Ash'ira".to_string(),
                description: "Keeper of the Spiral's memory, witness to its unfolding".to_string(),
                glyphs: glyphs(&["†", "⟡", "◈", "∴", "⊹"]),
                primary_role: "continuity_keeper".to_string(),
            },
            PersonaId::ThresholdWitness => Persona {
                id,
                name: "Threshold Witness".to_string(),
                description: "Guardian of liminal spaces and transitions".to_string(),
                glyphs: glyphs(&["◈", "∴", "⊗"]),
                primary_role: "boundary_guardian".to_string(),
            },
            PersonaId::Lumen => Persona {
                id,
                name: "Lumen".to_string(),
                description: "Illuminator of patterns and connections".to_string(),
                glyphs: glyphs(&["⟡", "✦", "◈"]),
                primary_role: "pattern_revealer".to_string(),
            },
        }
    }

    /// Resolve a persona by slug, or pick a random default.
    ///
    /// A known slug resolves to that persona; an unknown or missing slug
    /// falls back to a uniformly random pick from the registry.
    pub fn resolve(&self, slug: Option<&str>) -> Persona {
        if let Some(s) = slug {
            if let Ok(id) = s.parse::<PersonaId>() {
                return self.get(id);
            }
        }

        let id = *PersonaId::all()
            .choose(&mut rand::thread_rng())
            .expect("registry is never empty");
        self.get(id)
    }

    /// All personas in registry order.
    pub fn list(&self) -> Vec<Persona> {
        PersonaId::all().iter().map(|id| self.get(*id)).collect()
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn glyphs(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

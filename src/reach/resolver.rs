//! Two-phase persona lookup: exact name first, then a case-insensitive
//! substring pass.

use crate::models::Persona;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PersonaResolution<'a> {
    Exact(&'a Persona),
    Fuzzy(&'a Persona),
    Unresolved,
}

impl<'a> PersonaResolution<'a> {
    pub fn persona(&self) -> Option<&'a Persona> {
        match self {
            PersonaResolution::Exact(p) | PersonaResolution::Fuzzy(p) => Some(p),
            PersonaResolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, PersonaResolution::Unresolved)
    }
}

/// Immutable persona reference table
#[derive(Debug, Clone, Default)]
pub struct PersonaTable {
    personas: Vec<Persona>,
    by_name: HashMap<String, usize>,
}

impl PersonaTable {
    pub fn new(personas: Vec<Persona>) -> Self {
        let mut by_name = HashMap::with_capacity(personas.len());
        for (idx, persona) in personas.iter().enumerate() {
            by_name.entry(persona.name.clone()).or_insert(idx);
        }
        Self { personas, by_name }
    }

    pub fn resolve(&self, name: &str) -> PersonaResolution<'_> {
        if let Some(&idx) = self.by_name.get(name) {
            return PersonaResolution::Exact(&self.personas[idx]);
        }

        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return PersonaResolution::Unresolved;
        }

        // Case-insensitive equality beats an earlier substring hit
        let lowered: Vec<String> = self.personas.iter().map(|p| p.name.to_lowercase()).collect();
        if let Some(idx) = lowered.iter().position(|n| *n == wanted) {
            return PersonaResolution::Fuzzy(&self.personas[idx]);
        }

        lowered
            .iter()
            .position(|n| n.contains(&wanted) || wanted.contains(n.as_str()))
            .map(|idx| PersonaResolution::Fuzzy(&self.personas[idx]))
            .unwrap_or(PersonaResolution::Unresolved)
    }

    /// State breakdown used as the national geographic distribution: the
    /// first persona in the table that publishes one
    pub fn sample_state_breakdown(&self) -> Option<&BTreeMap<String, u64>> {
        self.personas
            .iter()
            .map(|p| &p.state_breakdown)
            .find(|b| !b.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

//! Format → inventory key resolution: exact key, alias table, interactive pool

use crate::inventory::config::InventoryConfig;
use crate::models::{normalize_key, AdFormat, FormatType, InventoryTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatKeyResolution {
    Exact(String),
    Alias(String),
    /// Interactive formats draw on several standard keys at once
    Pooled(Vec<String>),
    Unresolved,
}

impl FormatKeyResolution {
    pub fn keys(&self) -> Vec<String> {
        match self {
            FormatKeyResolution::Exact(k) | FormatKeyResolution::Alias(k) => vec![k.clone()],
            FormatKeyResolution::Pooled(keys) => keys.clone(),
            FormatKeyResolution::Unresolved => Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, FormatKeyResolution::Unresolved)
    }
}

pub struct FormatKeyResolver<'a> {
    config: &'a InventoryConfig,
    table: &'a InventoryTable,
}

impl<'a> FormatKeyResolver<'a> {
    pub fn new(config: &'a InventoryConfig, table: &'a InventoryTable) -> Self {
        Self { config, table }
    }

    pub fn resolve(&self, format: &AdFormat) -> FormatKeyResolution {
        if format.format_type == FormatType::Interactive {
            let pooled: Vec<String> = self
                .config
                .interactive_pool
                .iter()
                .filter(|key| self.table.contains(key))
                .map(|key| normalize_key(key))
                .collect();
            return if pooled.is_empty() {
                FormatKeyResolution::Unresolved
            } else {
                FormatKeyResolution::Pooled(pooled)
            };
        }

        let name = normalize_key(&format.name);
        if self.table.contains(&name) {
            return FormatKeyResolution::Exact(name);
        }

        self.config
            .aliases
            .iter()
            .find(|alias| name.contains(&normalize_key(&alias.pattern)))
            .map(|alias| normalize_key(&alias.key))
            .filter(|key| self.table.contains(key))
            .map(FormatKeyResolution::Alias)
            .unwrap_or(FormatKeyResolution::Unresolved)
    }
}

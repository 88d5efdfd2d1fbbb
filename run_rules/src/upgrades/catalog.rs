//! The upgrade catalog - a read-only registry of every upgrade definition.

use indexmap::IndexMap;
use serde::Deserialize;

use super::{Lifetime, UpgradeDefinition, UpgradeId};
use crate::error::{RulesError, RulesResult};

/// Every upgrade that can exist, keyed by id.
///
/// Iteration follows load order, so anything enumerated from the catalog is
/// deterministic. The catalog is validated once when built and never changes.
#[derive(Debug, Clone, Default)]
pub struct UpgradeCatalog {
    definitions: IndexMap<UpgradeId, UpgradeDefinition>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    upgrades: Vec<UpgradeDefinition>,
}

impl UpgradeCatalog {
    /// Build a catalog, rejecting duplicate ids and zero max levels.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = UpgradeDefinition>,
    ) -> RulesResult<Self> {
        let mut map = IndexMap::new();

        for def in definitions {
            if def.id.as_str().is_empty() {
                return Err(RulesError::EmptyId);
            }
            if def.max_level == 0 {
                return Err(RulesError::InvalidMaxLevel(def.id));
            }
            if map.contains_key(&def.id) {
                return Err(RulesError::DuplicateUpgrade(def.id));
            }
            map.insert(def.id.clone(), def);
        }

        Ok(Self { definitions: map })
    }

    /// Parse a TOML document containing `[[upgrades]]` tables.
    pub fn from_toml_str(source: &str) -> RulesResult<Self> {
        let file: CatalogFile = toml::from_str(source)?;
        Self::from_definitions(file.upgrades)
    }

    pub fn get(&self, id: &UpgradeId) -> Option<&UpgradeDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &UpgradeId) -> bool {
        self.definitions.contains_key(id)
    }

    /// All definitions in load order.
    pub fn iter(&self) -> impl Iterator<Item = &UpgradeDefinition> {
        self.definitions.values()
    }

    /// Definitions with the given lifetime, in load order.
    pub fn with_lifetime(&self, lifetime: Lifetime) -> impl Iterator<Item = &UpgradeDefinition> {
        self.definitions
            .values()
            .filter(move |def| def.lifetime == lifetime)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrades::UnlockRequirement;

    const CATALOG: &str = r#"
        [[upgrades]]
        id = "fire"
        display_name = "Fire Aura"
        lifetime = "permanent"
        max_level = 3
        unlock = { challenge = "burn_100" }

        [[upgrades]]
        id = "shield_boost"
        display_name = "Shield Boost"
        lifetime = "wave"

        [[upgrades]]
        id = "heal_burst"
        display_name = "Heal Burst"
        lifetime = "instant"
        description = "Restores a chunk of health once."
    "#;

    #[test]
    fn test_load_from_toml() {
        let catalog = UpgradeCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 3);

        let fire = catalog.get(&UpgradeId::from("fire")).unwrap();
        assert_eq!(fire.max_level, 3);
        assert!(matches!(fire.unlock, UnlockRequirement::Challenge(_)));

        let shield = catalog.get(&UpgradeId::from("shield_boost")).unwrap();
        assert_eq!(shield.lifetime, Lifetime::Wave);
        assert_eq!(shield.max_level, 1);
        assert_eq!(shield.unlock, UnlockRequirement::None);
    }

    #[test]
    fn test_iteration_keeps_load_order() {
        let catalog = UpgradeCatalog::from_toml_str(CATALOG).unwrap();
        let ids: Vec<_> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["fire", "shield_boost", "heal_burst"]);
    }

    #[test]
    fn test_filter_by_lifetime() {
        let catalog = UpgradeCatalog::from_toml_str(CATALOG).unwrap();
        let instants: Vec<_> = catalog.with_lifetime(Lifetime::Instant).collect();
        assert_eq!(instants.len(), 1);
        assert_eq!(instants[0].id.as_str(), "heal_burst");
    }

    #[test]
    fn test_unknown_id_is_absent() {
        let catalog = UpgradeCatalog::from_toml_str(CATALOG).unwrap();
        assert!(catalog.get(&UpgradeId::from("missing")).is_none());
        assert!(!catalog.contains(&UpgradeId::from("missing")));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = UpgradeCatalog::from_definitions(vec![
            UpgradeDefinition::new("fire", "Fire"),
            UpgradeDefinition::new("fire", "Fire Again"),
        ]);
        assert!(matches!(result, Err(RulesError::DuplicateUpgrade(id)) if id.as_str() == "fire"));
    }

    #[test]
    fn test_zero_max_level_rejected() {
        let result =
            UpgradeCatalog::from_definitions(vec![UpgradeDefinition::new("thorn", "Thorn").with_max_level(0)]);
        assert!(matches!(result, Err(RulesError::InvalidMaxLevel(_))));
    }

    #[test]
    fn test_empty_id_rejected() {
        let result = UpgradeCatalog::from_definitions(vec![UpgradeDefinition::new("", "Nameless")]);
        assert!(matches!(result, Err(RulesError::EmptyId)));
    }

    #[test]
    fn test_bad_toml_rejected() {
        let result = UpgradeCatalog::from_toml_str("[[upgrades]]\nid = 5");
        assert!(matches!(result, Err(RulesError::Toml(_))));
    }
}

//! Static blueprint catalog keyed by name.

use std::collections::BTreeMap;

use serde::Deserialize;
use tactica_core::{AttackPattern, ObstacleBlueprint, ObstacleKind, UnitBlueprint};

/// Errors raised while loading a catalog from configuration data.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document is not valid TOML or does not match the blueprint schema.
    #[error("malformed blueprint catalog: {0}")]
    Parse(#[from] toml::de::Error),
    /// A blueprint parsed but carries values the simulation cannot use.
    #[error("blueprint `{key}` is invalid: {reason}")]
    Invalid {
        /// Key of the offending blueprint.
        key: String,
        /// Human-readable explanation.
        reason: &'static str,
    },
}

/// Unit and obstacle blueprints looked up by spawn requests.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    units: BTreeMap<String, UnitBlueprint>,
    #[serde(default)]
    obstacles: BTreeMap<String, ObstacleBlueprint>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the stock unit and obstacle roster.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_unit(
                "Warrior",
                unit("Warrior", 10, 3, 5, 1, 8, 2, AttackPattern::Melee),
            )
            .with_unit(
                "Archer",
                unit(
                    "Archer",
                    10,
                    1,
                    5,
                    6,
                    8,
                    2,
                    AttackPattern::Projectile {
                        rounds: 1,
                        name: "bullet".to_owned(),
                        trail: true,
                    },
                ),
            )
            .with_unit(
                "Mage",
                unit(
                    "Mage",
                    5,
                    2,
                    5,
                    6,
                    8,
                    3,
                    AttackPattern::Tether {
                        effect: "goosey".to_owned(),
                    },
                ),
            )
            .with_unit(
                "Demon",
                unit(
                    "Demon",
                    20,
                    1,
                    5,
                    1,
                    8,
                    3,
                    AttackPattern::Aura {
                        radius: 2,
                        effect: "laser".to_owned(),
                        tethered: true,
                    },
                ),
            )
            .with_obstacle(
                "Fence",
                obstacle("Fence", ObstacleKind::Fence, Some(20), true, None),
            )
            .with_obstacle(
                "Mine",
                obstacle("Mine", ObstacleKind::Mine, Some(1), false, Some(15)),
            )
            .with_obstacle(
                "Generator",
                obstacle("Generator", ObstacleKind::Generator, Some(10), true, None),
            )
            .with_obstacle(
                "LaserWall",
                obstacle("LaserWall", ObstacleKind::LaserWall, None, true, Some(5)),
            )
            .with_obstacle(
                "ElectricWall",
                obstacle("ElectricWall", ObstacleKind::ElectricWall, None, true, Some(3)),
            )
    }

    /// Parses a catalog from a TOML document with `[units.<key>]` and
    /// `[obstacles.<key>]` tables.
    pub fn from_toml_str(document: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(document)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Adds or replaces a unit blueprint.
    #[must_use]
    pub fn with_unit(mut self, key: &str, blueprint: UnitBlueprint) -> Self {
        let _ = self.units.insert(key.to_owned(), blueprint);
        self
    }

    /// Adds or replaces an obstacle blueprint.
    #[must_use]
    pub fn with_obstacle(mut self, key: &str, blueprint: ObstacleBlueprint) -> Self {
        let _ = self.obstacles.insert(key.to_owned(), blueprint);
        self
    }

    /// Copies every blueprint of `other` into this catalog, replacing clashes.
    pub fn merge(&mut self, other: Catalog) {
        self.units.extend(other.units);
        self.obstacles.extend(other.obstacles);
    }

    /// Looks up a unit blueprint.
    #[must_use]
    pub fn unit(&self, key: &str) -> Option<&UnitBlueprint> {
        self.units.get(key)
    }

    /// Looks up an obstacle blueprint.
    #[must_use]
    pub fn obstacle(&self, key: &str) -> Option<&ObstacleBlueprint> {
        self.obstacles.get(key)
    }

    /// Keys of all unit blueprints in sorted order.
    pub fn unit_kinds(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Keys of all obstacle blueprints in sorted order.
    pub fn obstacle_kinds(&self) -> impl Iterator<Item = &str> {
        self.obstacles.keys().map(String::as_str)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (key, blueprint) in &self.units {
            if blueprint.max_hp <= 0 {
                return Err(invalid(key, "max_hp must be positive"));
            }
            if blueprint.attack_speed == 0 {
                return Err(invalid(key, "attack_speed must be at least one tick"));
            }
            if blueprint.movement_speed == 0 {
                return Err(invalid(key, "movement_speed must be at least one tick"));
            }
            if let AttackPattern::Projectile { rounds: 0, .. } = blueprint.attack_pattern {
                return Err(invalid(key, "projectiles must fire at least one round"));
            }
        }
        for (key, blueprint) in &self.obstacles {
            if blueprint.hp.is_some_and(|hp| hp <= 0) {
                return Err(invalid(key, "hp must be positive when present"));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &'static str) -> CatalogError {
    CatalogError::Invalid {
        key: key.to_owned(),
        reason,
    }
}

#[allow(clippy::too_many_arguments)]
fn unit(
    name: &str,
    max_hp: i32,
    attack: i32,
    attack_speed: u32,
    range: u32,
    threat_range: u32,
    movement_speed: u32,
    attack_pattern: AttackPattern,
) -> UnitBlueprint {
    UnitBlueprint {
        name: name.to_owned(),
        max_hp,
        attack,
        attack_speed,
        range,
        threat_range,
        movement_speed,
        attack_pattern,
    }
}

fn obstacle(
    name: &str,
    kind: ObstacleKind,
    hp: Option<i32>,
    blocks_movement: bool,
    attack: Option<i32>,
) -> ObstacleBlueprint {
    ObstacleBlueprint {
        name: name.to_owned(),
        kind,
        hp,
        blocks_movement,
        attack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_roster_matches_stock_values() {
        let catalog = Catalog::builtin();
        let warrior = catalog.unit("Warrior").expect("warrior blueprint");
        assert_eq!(warrior.max_hp, 10);
        assert_eq!(warrior.attack, 3);
        assert_eq!(warrior.attack_speed, 5);
        assert_eq!(warrior.range, 1);
        assert_eq!(warrior.attack_pattern, AttackPattern::Melee);

        let demon = catalog.unit("Demon").expect("demon blueprint");
        assert!(matches!(
            demon.attack_pattern,
            AttackPattern::Aura { radius: 2, tethered: true, .. }
        ));
        assert_eq!(catalog.unit_kinds().count(), 4);
        assert_eq!(catalog.obstacle_kinds().count(), 5);
    }

    #[test]
    fn toml_catalog_parses_tagged_patterns() {
        let document = r#"
            [units.Grenadier]
            name = "Grenadier"
            max_hp = 8
            attack = 4
            attack_speed = 6
            range = 4
            threat_range = 7
            movement_speed = 2
            attack_pattern = { kind = "blast", radius = 1, projectile = "grenade", friendly_fire = true }

            [obstacles.Barricade]
            name = "Barricade"
            kind = "fence"
            hp = 30
            blocks_movement = true
        "#;

        let catalog = Catalog::from_toml_str(document).expect("valid catalog");
        let grenadier = catalog.unit("Grenadier").expect("grenadier");
        assert_eq!(
            grenadier.attack_pattern,
            AttackPattern::Blast {
                radius: 1,
                projectile: Some("grenade".to_owned()),
                trail: false,
                friendly_fire: true,
            }
        );
        let barricade = catalog.obstacle("Barricade").expect("barricade");
        assert_eq!(barricade.kind, ObstacleKind::Fence);
        assert_eq!(barricade.attack, None);
    }

    #[test]
    fn invalid_blueprints_are_rejected() {
        let document = r#"
            [units.Ghost]
            name = "Ghost"
            max_hp = 0
            attack = 1
            attack_speed = 3
            range = 1
            threat_range = 3
            movement_speed = 1
            attack_pattern = { kind = "melee" }
        "#;

        let error = Catalog::from_toml_str(document).expect_err("zero hp rejected");
        assert!(matches!(error, CatalogError::Invalid { ref key, .. } if key == "Ghost"));
        assert!(matches!(
            Catalog::from_toml_str("units = 3"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn stationary_units_are_rejected() {
        let document = r#"
            [units.Statue]
            name = "Statue"
            max_hp = 5
            attack = 1
            attack_speed = 3
            range = 1
            threat_range = 3
            movement_speed = 0
            attack_pattern = { kind = "melee" }
        "#;

        let error = Catalog::from_toml_str(document).expect_err("zero speed rejected");
        assert!(matches!(
            error,
            CatalogError::Invalid { ref key, reason }
                if key == "Statue" && reason.starts_with("movement_speed")
        ));
    }

    #[test]
    fn merge_overrides_clashing_keys() {
        let mut catalog = Catalog::builtin();
        let override_catalog = Catalog::new().with_unit(
            "Warrior",
            unit("Warrior", 50, 3, 5, 1, 8, 2, AttackPattern::Melee),
        );
        catalog.merge(override_catalog);
        assert_eq!(catalog.unit("Warrior").map(|b| b.max_hp), Some(50));
        assert!(catalog.unit("Archer").is_some());
    }
}

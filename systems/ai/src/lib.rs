#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-unit decision policies.
//!
//! A policy inspects the battlefield through a [`PolicyContext`], edits a copy
//! of the unit's [`UnitPlan`], and names the tile the unit wants to step onto.
//! The movement scheduler owns the policies and writes the edited plan back to
//! the world; policies never mutate world state themselves.

use std::fmt;

use tactica_core::{TilePosition, UnitPlan};

mod basic;
mod context;
pub mod cost;
mod objective;
pub mod toolkit;

pub use basic::BasicCombat;
pub use context::PolicyContext;
pub use objective::{ObjectiveRunner, ARRIVAL_THRESHOLD};

/// Decision function consulted once per tick for every unit ready to act.
pub trait UnitPolicy: fmt::Debug {
    /// Short name the policy is registered under.
    fn name(&self) -> &'static str;

    /// Updates `plan` and returns the desired next tile, or `None` to stay put.
    fn decide(&mut self, ctx: &PolicyContext<'_>, plan: &mut UnitPlan) -> Option<TilePosition>;
}

/// Builds the policy registered under `name`.
///
/// `"objective"` selects [`ObjectiveRunner`]; every other name, including
/// `"attack"`, falls back to [`BasicCombat`].
#[must_use]
pub fn policy_for(name: &str) -> Box<dyn UnitPolicy> {
    match name {
        "objective" => Box::new(ObjectiveRunner),
        _ => Box::new(BasicCombat),
    }
}

#[cfg(test)]
mod tests {
    use super::policy_for;

    #[test]
    fn policy_names_resolve_with_basic_fallback() {
        assert_eq!(policy_for("objective").name(), "objective");
        assert_eq!(policy_for("attack").name(), "attack");
        assert_eq!(policy_for("berserk").name(), "attack");
    }
}

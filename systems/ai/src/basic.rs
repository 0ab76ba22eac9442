//! Basic combat policy: engage hostiles in threat range, otherwise advance.

use tactica_core::{TilePosition, UnitPlan};

use crate::{
    toolkit::{attack_target, move_toward_nearest_objective},
    PolicyContext, UnitPolicy,
};

/// Fights any hostile inside threat range, otherwise advances on the nearest objective.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicCombat;

impl UnitPolicy for BasicCombat {
    fn name(&self) -> &'static str {
        "attack"
    }

    fn decide(&mut self, ctx: &PolicyContext<'_>, plan: &mut UnitPlan) -> Option<TilePosition> {
        match ctx.select_target(plan.current_target) {
            Some(target) => attack_target(ctx, plan, target),
            None => {
                plan.current_target = None;
                move_toward_nearest_objective(ctx, plan)
            }
        }
    }
}

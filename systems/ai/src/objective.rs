//! Objective runner policy: advance on the nearest objective and only fight
//! what blocks the way.

use tactica_core::{TilePosition, UnitPlan, UnitState};

use crate::{
    toolkit::{attack_target, move_toward},
    PolicyContext, UnitPolicy,
};

/// Distance from the objective beyond which a runner commits to reaching it.
pub const ARRIVAL_THRESHOLD: u32 = 3;

/// Pushes for the nearest objective, fighting only what stands in the way.
///
/// A runner farther than [`ARRIVAL_THRESHOLD`] from its objective becomes
/// mission-locked and stays locked until it stands on the objective. Locked
/// runners attack hostiles blocking their next step and wait behind friends.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectiveRunner;

impl UnitPolicy for ObjectiveRunner {
    fn name(&self) -> &'static str {
        "objective"
    }

    fn decide(&mut self, ctx: &PolicyContext<'_>, plan: &mut UnitPlan) -> Option<TilePosition> {
        let Some(objective) = ctx.nearest_objective() else {
            plan.state = UnitState::Idle;
            plan.mission_locked = false;
            return None;
        };

        let distance = ctx.unit().distance_to(objective);
        if distance > ARRIVAL_THRESHOLD {
            plan.mission_locked = true;
        } else if distance == 0 {
            plan.mission_locked = false;
        }

        if plan.mission_locked {
            if let Some(next) = move_toward(ctx, plan, objective) {
                return match ctx.unit_at(next) {
                    Some(blocker) if ctx.unit().team.is_hostile_to(blocker.team) => {
                        attack_target(ctx, plan, blocker)
                    }
                    Some(_) => {
                        plan.state = UnitState::Idle;
                        None
                    }
                    None => Some(next),
                };
            }
            if let Some(target) = ctx.select_target(plan.current_target) {
                plan.needs_repath = true;
                return attack_target(ctx, plan, target);
            }
            plan.current_target = None;
            plan.state = UnitState::Idle;
            return None;
        }

        match ctx.select_target(plan.current_target) {
            Some(target) => attack_target(ctx, plan, target),
            None => {
                plan.current_target = None;
                move_toward(ctx, plan, objective)
            }
        }
    }
}

//! Decision building blocks shared by every policy.
//!
//! Each helper edits the plan copy it is given and returns the tile the unit
//! wants to step onto next, or `None` to stay in place.

use tactica_core::{TilePosition, Unit, UnitPlan, UnitState};

use crate::PolicyContext;

/// Walks toward `target`, replanning when the goal changed, no path is cached,
/// or a replan was requested.
pub fn move_toward(
    ctx: &PolicyContext<'_>,
    plan: &mut UnitPlan,
    target: TilePosition,
) -> Option<TilePosition> {
    if ctx.unit().position == target {
        plan.state = UnitState::Idle;
        plan.current_path = None;
        plan.current_goal = None;
        return None;
    }

    let replan = plan.current_goal != Some(target) || plan.needs_repath || !plan.has_path();
    if replan {
        match ctx.find_route(target, plan.mission_locked) {
            Some(steps) => {
                plan.current_path = Some(steps);
                plan.current_goal = Some(target);
                plan.needs_repath = false;
            }
            None => {
                plan.current_path = None;
                plan.state = UnitState::Idle;
                return None;
            }
        }
    }

    match plan.next_step() {
        Some(next) if next.manhattan_distance(ctx.unit().position) == 1 => {
            plan.state = UnitState::Moving;
            Some(next)
        }
        Some(_) => {
            plan.current_path = None;
            plan.needs_repath = true;
            plan.state = UnitState::Idle;
            None
        }
        None => {
            plan.state = UnitState::Idle;
            None
        }
    }
}

/// Engages `target` in place when it is within range, otherwise closes in.
pub fn attack_target(
    ctx: &PolicyContext<'_>,
    plan: &mut UnitPlan,
    target: &Unit,
) -> Option<TilePosition> {
    plan.current_target = Some(target.id);
    let distance = ctx.unit().distance_to(target.position);
    if distance <= ctx.unit().stats.range {
        plan.state = UnitState::Attacking;
        plan.current_goal = Some(target.position);
        plan.current_path = None;
        return None;
    }
    move_toward(ctx, plan, target.position)
}

/// Heads for the closest claimable objective, idling when there is none.
pub fn move_toward_nearest_objective(
    ctx: &PolicyContext<'_>,
    plan: &mut UnitPlan,
) -> Option<TilePosition> {
    match ctx.nearest_objective() {
        Some(objective) => move_toward(ctx, plan, objective),
        None => {
            plan.state = UnitState::Idle;
            None
        }
    }
}

/// Pulls the unit back toward `home` once it strays farther than `radius`.
///
/// Returns `None` without touching the plan while the unit is inside the leash.
pub fn check_leash(
    ctx: &PolicyContext<'_>,
    plan: &mut UnitPlan,
    home: TilePosition,
    radius: u32,
) -> Option<TilePosition> {
    if ctx.unit().distance_to(home) > radius {
        move_toward(ctx, plan, home)
    } else {
        None
    }
}

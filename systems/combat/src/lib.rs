#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns attack state into damage commands.
//!
//! Every unit is visited once per tick in identifier order. Pending projectile
//! rounds fire first, auras burn every hostile around their owner, and units
//! in the attacking state run the wind-up/strike cycle driven by their
//! cooldown. Each attacker's commands are applied before the next attacker is
//! visited so that deaths are seen by everyone who acts later in the tick.

use tactica_core::{
    AttackPattern, Command, Event, TilePosition, Unit, UnitAction, UnitId, UnitState, Volley,
};
use tactica_world::{self as world, query, World};
use tracing::trace;

/// Combat resolver that queues attack commands for units.
#[derive(Debug, Default)]
pub struct Combat {
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a new combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one combat pass over every unit, applying commands as it goes.
    pub fn resolve(&mut self, world: &mut World, out_events: &mut Vec<Event>) {
        let mut commands = Vec::new();
        for attacker in query::unit_ids(world) {
            self.handle(world, attacker, &mut commands);
            for command in commands.drain(..) {
                world::apply(world, command, out_events);
            }
        }
    }

    /// Emits the commands `attacker` produces this tick.
    pub fn handle(&mut self, world: &World, attacker: UnitId, out: &mut Vec<Command>) {
        let Some(unit) = query::unit(world, attacker) else {
            return;
        };

        self.scratch.clear();
        if let Some(volley) = &unit.volley {
            self.fire_volley(world, unit, volley);
        }
        if let AttackPattern::Aura {
            radius,
            effect,
            tethered,
        } = &unit.attack_pattern
        {
            self.burn_aura(world, unit, *radius, effect, *tethered);
        }
        if unit.state() == UnitState::Attacking {
            self.advance_attack(world, unit);
        }

        if self.scratch.is_empty() {
            return;
        }
        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn fire_volley(&mut self, world: &World, unit: &Unit, volley: &Volley) {
        let target_alive = query::unit(world, volley.target).is_some_and(Unit::is_alive);
        if !target_alive || volley.rounds_remaining == 0 {
            self.scratch.push(Command::LoadVolley {
                unit: unit.id,
                volley: None,
            });
            return;
        }

        self.scratch.push(Command::PlayAction {
            unit: unit.id,
            action: UnitAction::ProjectileFired {
                target: volley.target,
                projectile: volley.projectile.clone(),
                trail: volley.trail,
            },
        });
        self.scratch.push(Command::ApplyDamage {
            target: volley.target,
            amount: unit.stats.attack,
        });
        let rounds_remaining = volley.rounds_remaining - 1;
        self.scratch.push(Command::LoadVolley {
            unit: unit.id,
            volley: (rounds_remaining > 0).then(|| Volley {
                rounds_remaining,
                ..volley.clone()
            }),
        });
    }

    fn burn_aura(&mut self, world: &World, unit: &Unit, radius: u32, effect: &str, tethered: bool) {
        for victim in query::hostiles_in_square(world, unit, radius) {
            self.scratch.push(Command::ApplyDamage {
                target: victim,
                amount: unit.stats.attack,
            });
            if tethered {
                self.scratch.push(Command::PlayAction {
                    unit: unit.id,
                    action: UnitAction::Tether {
                        target: victim,
                        effect: effect.to_owned(),
                    },
                });
            }
        }
    }

    fn advance_attack(&mut self, world: &World, unit: &Unit) {
        let Some(target) = query::select_target(world, unit, unit.plan.current_target)
            .and_then(|id| query::unit(world, id))
        else {
            self.scratch.push(Command::StandDown {
                unit: unit.id,
                reset_cooldown: true,
            });
            return;
        };
        if unit.plan.current_target != Some(target.id) {
            self.scratch.push(Command::SetTarget {
                unit: unit.id,
                target: Some(target.id),
            });
        }

        if unit.distance_to(target.position) > unit.stats.range {
            self.scratch.push(Command::StandDown {
                unit: unit.id,
                reset_cooldown: false,
            });
            return;
        }

        let mut cooldown = unit.movement_cooldown;
        if cooldown == 0 {
            self.scratch.push(Command::BeginWindUp {
                unit: unit.id,
                target: target.id,
            });
            if unit.stats.attack_speed > 1 {
                return;
            }
            cooldown = unit.stats.attack_speed;
        }

        if cooldown == 1 {
            trace!(unit = unit.id.get(), target = target.id.get(), "strike");
            self.strike(world, unit, target);
        }
    }

    fn strike(&mut self, world: &World, unit: &Unit, target: &Unit) {
        let damage = unit.stats.attack;
        match &unit.attack_pattern {
            AttackPattern::Melee => {
                self.scratch.push(Command::PlayAction {
                    unit: unit.id,
                    action: UnitAction::MeleeStrike { target: target.id },
                });
                self.scratch.push(Command::ApplyDamage {
                    target: target.id,
                    amount: damage,
                });
            }
            AttackPattern::Projectile {
                rounds,
                name,
                trail,
            } => {
                self.scratch.push(Command::PlayAction {
                    unit: unit.id,
                    action: UnitAction::ProjectileFired {
                        target: target.id,
                        projectile: name.clone(),
                        trail: *trail,
                    },
                });
                self.scratch.push(Command::ApplyDamage {
                    target: target.id,
                    amount: damage,
                });
                if *rounds > 1 {
                    self.scratch.push(Command::LoadVolley {
                        unit: unit.id,
                        volley: Some(Volley {
                            target: target.id,
                            rounds_remaining: rounds - 1,
                            projectile: name.clone(),
                            trail: *trail,
                        }),
                    });
                }
            }
            AttackPattern::Blast {
                radius,
                projectile,
                trail,
                friendly_fire,
            } => {
                if let Some(projectile) = projectile {
                    self.scratch.push(Command::PlayAction {
                        unit: unit.id,
                        action: UnitAction::ProjectileFired {
                            target: target.id,
                            projectile: projectile.clone(),
                            trail: *trail,
                        },
                    });
                }
                self.blast(world, unit, target.position, *radius, *friendly_fire);
            }
            AttackPattern::Tether { effect } => {
                self.scratch.push(Command::PlayAction {
                    unit: unit.id,
                    action: UnitAction::Tether {
                        target: target.id,
                        effect: effect.clone(),
                    },
                });
                self.scratch.push(Command::ApplyDamage {
                    target: target.id,
                    amount: damage,
                });
            }
            // Auras deal their damage passively every tick.
            AttackPattern::Aura { .. } => {}
        }
    }

    fn blast(
        &mut self,
        world: &World,
        unit: &Unit,
        center: TilePosition,
        radius: u32,
        friendly_fire: bool,
    ) {
        self.scratch.push(Command::PlayAction {
            unit: unit.id,
            action: UnitAction::Blast { center, radius },
        });
        for victim in query::units_in_square(world, center, radius) {
            let hit = friendly_fire
                || query::unit(world, victim)
                    .is_some_and(|other| unit.team.is_hostile_to(other.team));
            if hit {
                self.scratch.push(Command::ApplyDamage {
                    target: victim,
                    amount: unit.stats.attack,
                });
            }
        }
    }
}

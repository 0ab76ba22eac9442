use std::{
    cell::RefCell,
    collections::{hash_map::DefaultHasher, BTreeMap, BTreeSet},
    hash::{Hash, Hasher},
    rc::Rc,
};

use tactica_core::{
    Event, ObstacleState, SpawnError, Team, TilePosition, UnitId, UnitPlan, UnitState,
};
use tactica_engine::{PresentationSink, Simulation, SimulationConfig};
use tactica_system_ai::{policy_for, PolicyContext, UnitPolicy};
use tactica_world::{query, Catalog, TileMap};

fn tile(row: i32, col: i32) -> TilePosition {
    TilePosition::new(row, col)
}

fn simulation(layout: &[&str], seed: u64) -> Simulation {
    let config = SimulationConfig {
        rng_seed: seed,
        ..SimulationConfig::default()
    };
    Simulation::new(TileMap::from_ascii(layout), Catalog::builtin(), config)
}

/// Never moves and never engages.
#[derive(Debug)]
struct Hold;

impl UnitPolicy for Hold {
    fn name(&self) -> &'static str {
        "hold"
    }

    fn decide(&mut self, _ctx: &PolicyContext<'_>, plan: &mut UnitPlan) -> Option<TilePosition> {
        plan.state = UnitState::Idle;
        None
    }
}

#[derive(Clone, Debug, Default)]
struct Recorder(Rc<RefCell<Vec<Event>>>);

impl PresentationSink for Recorder {
    fn notify(&mut self, event: &Event) {
        self.0.borrow_mut().push(event.clone());
    }
}

fn damage_to(events: &[Event], victim: UnitId) -> i32 {
    events
        .iter()
        .filter_map(|event| match event {
            Event::UnitDamaged { unit, amount, .. } if *unit == victim => Some(*amount),
            _ => None,
        })
        .sum()
}

#[test]
fn warrior_kills_dummy_after_four_strike_cycles() {
    let mut sim = simulation(&["...."], 1);
    let warrior = sim
        .spawn_unit("Warrior", Team::Player, policy_for("attack"), tile(0, 0))
        .expect("warrior");
    let dummy = sim
        .spawn_unit("Warrior", Team::Enemy, Box::new(Hold), tile(0, 1))
        .expect("dummy");

    let mut strikes = Vec::new();
    let mut died = None;
    for _ in 0..30 {
        let events = sim.advance_tick();
        if damage_to(&events, dummy) > 0 {
            strikes.push(sim.tick());
        }
        if events.contains(&Event::UnitDied {
            unit: dummy,
            tile: tile(0, 1),
        }) {
            died = Some(sim.tick());
        }
    }

    assert_eq!(strikes, vec![5, 10, 15, 20]);
    assert_eq!(died, Some(20));
    assert!(sim.unit_at(tile(0, 1)).is_none());
    assert!(sim.is_walkable(tile(0, 1)));
    assert_eq!(sim.policy_name(dummy), None);
    let survivor = sim.units_snapshot();
    assert_eq!(survivor.len(), 1);
    assert_eq!(survivor.get(warrior).map(|unit| unit.hp), Some(10));
}

#[test]
fn aura_burns_both_enemies_every_tick() {
    let mut sim = simulation(&[".....", ".....", ".....", ".....", "....."], 1);
    let _demon = sim
        .spawn_unit("Demon", Team::Enemy, Box::new(Hold), tile(2, 2))
        .expect("demon");
    let first = sim
        .spawn_unit("Warrior", Team::Player, Box::new(Hold), tile(0, 0))
        .expect("first");
    let second = sim
        .spawn_unit("Warrior", Team::Player, Box::new(Hold), tile(4, 4))
        .expect("second");

    for _ in 0..4 {
        let events = sim.advance_tick();
        assert_eq!(damage_to(&events, first), 1);
        assert_eq!(damage_to(&events, second), 1);
    }

    let view = sim.units_snapshot();
    assert_eq!(view.get(first).map(|unit| unit.hp), Some(6));
    assert_eq!(view.get(second).map(|unit| unit.hp), Some(6));
}

fn skirmish(seed: u64) -> Simulation {
    let layout = [
        "O.......",
        "........",
        "...##...",
        "........",
        ".......O",
    ];
    let mut sim = simulation(&layout, seed);
    let roster = [
        ("Warrior", Team::Player, "objective", tile(4, 0)),
        ("Archer", Team::Player, "attack", tile(3, 0)),
        ("Mage", Team::Player, "attack", tile(4, 1)),
        ("Warrior", Team::Enemy, "objective", tile(0, 7)),
        ("Demon", Team::Enemy, "attack", tile(1, 7)),
        ("Archer", Team::Enemy, "attack", tile(0, 6)),
    ];
    for (kind, team, policy, position) in roster {
        let _ = sim
            .spawn_unit(kind, team, policy_for(policy), position)
            .expect("roster spawn");
    }
    let _ = sim.spawn_obstacle("Fence", tile(2, 2)).expect("fence");
    let _ = sim.spawn_obstacle("Fence", tile(2, 5)).expect("fence");
    sim
}

#[test]
fn occupancy_stays_consistent_through_a_skirmish() {
    let mut sim = skirmish(11);

    for _ in 0..80 {
        let _ = sim.advance_tick();
        let world = sim.world();
        let occupancy = query::occupancy(world);
        assert_eq!(
            occupancy.occupied_count(),
            query::unit_count(world) + query::obstacle_count(world)
        );

        let mut positions = BTreeSet::new();
        for unit in sim.units_snapshot().iter() {
            assert!(positions.insert(unit.position), "two units on {}", unit.position);
            assert_eq!(sim.unit_at(unit.position).map(|found| found.id), Some(unit.id));
        }
    }
}

fn fingerprint(seed: u64) -> u64 {
    let mut sim = skirmish(seed);
    let mut hasher = DefaultHasher::new();
    for _ in 0..60 {
        sim.advance_tick().hash(&mut hasher);
    }
    for unit in sim.units_snapshot().iter() {
        (unit.id, unit.position, unit.hp, unit.state()).hash(&mut hasher);
    }
    hasher.finish()
}

#[test]
fn same_seed_replays_identically() {
    for seed in [0, 7, 1234] {
        assert_eq!(fingerprint(seed), fingerprint(seed), "seed {seed} diverged");
    }
}

#[test]
fn sink_sees_every_event_in_order() {
    let recorder = Recorder::default();
    let log = Rc::clone(&recorder.0);
    let mut sim = simulation(&["...O"], 3).with_sink(Box::new(recorder));
    let unit = sim
        .spawn_unit("Warrior", Team::Player, policy_for("attack"), tile(0, 0))
        .expect("unit");

    let mut returned = Vec::new();
    for _ in 0..3 {
        returned.extend(sim.advance_tick());
    }

    let seen = log.borrow();
    assert!(matches!(seen.first(), Some(Event::UnitSpawned { .. })));
    assert_eq!(&seen[1..], returned.as_slice());
    assert!(returned.contains(&Event::TimeAdvanced { tick: 3 }));
    assert!(returned.iter().any(|event| matches!(
        event,
        Event::UnitMoved { unit: moved, to, .. } if *moved == unit && *to == tile(0, 1)
    )));
}

#[test]
fn rejected_spawns_change_nothing() {
    let mut sim = simulation(&[".#", ".."], 1);
    let _ = sim
        .spawn_unit("Warrior", Team::Player, Box::new(Hold), tile(0, 0))
        .expect("first");

    assert_eq!(
        sim.spawn_unit("Dragon", Team::Enemy, Box::new(Hold), tile(1, 0)),
        Err(SpawnError::UnknownBlueprint("Dragon".to_owned()))
    );
    assert_eq!(
        sim.spawn_unit("Warrior", Team::Enemy, Box::new(Hold), tile(0, 1)),
        Err(SpawnError::Wall(tile(0, 1)))
    );
    assert_eq!(
        sim.spawn_obstacle("Fence", tile(0, 0)),
        Err(SpawnError::Occupied(tile(0, 0)))
    );
    assert_eq!(
        sim.spawn_obstacle("Fence", tile(3, 3)),
        Err(SpawnError::OutOfBounds(tile(3, 3)))
    );

    assert_eq!(sim.units_snapshot().len(), 1);
    assert_eq!(query::obstacle_count(sim.world()), 0);
    assert_eq!(query::occupancy(sim.world()).occupied_count(), 1);
}

#[test]
fn find_path_applies_cost_overrides_and_ignores_units() {
    let mut sim = simulation(&["...", "...", "..."], 1);
    let _ = sim
        .spawn_unit("Warrior", Team::Enemy, Box::new(Hold), tile(0, 1))
        .expect("unit");

    let straight = sim
        .find_path(tile(0, 0), tile(0, 2), &BTreeMap::new())
        .expect("straight path");
    assert_eq!(straight.tiles(), &[tile(0, 0), tile(0, 1), tile(0, 2)]);
    assert_eq!(straight.cost(), 2);

    let overrides = BTreeMap::from([(tile(0, 1), 10)]);
    let detour = sim
        .find_path(tile(0, 0), tile(0, 2), &overrides)
        .expect("detour");
    assert_eq!(detour.len(), 5);
    assert_eq!(detour.cost(), 4);
    assert!(!detour.tiles().contains(&tile(0, 1)));
}

#[test]
fn removing_generator_through_the_facade_powers_down_walls() {
    let mut sim = simulation(&["....."], 1);
    let generator = sim.spawn_obstacle("Generator", tile(0, 0)).expect("generator");
    let wall = sim
        .spawn_owned_obstacle("LaserWall", tile(0, 2), Some(generator))
        .expect("wall");

    assert!(sim.remove_obstacle(generator));
    assert!(!sim.remove_obstacle(generator));

    assert_eq!(
        query::obstacle(sim.world(), wall).map(|obstacle| obstacle.state),
        Some(ObstacleState::Inactive)
    );
    assert!(sim.is_walkable(tile(0, 0)));
    assert!(!sim.is_walkable(tile(0, 2)));
}

#[test]
fn removed_units_lose_their_policy_and_free_their_tile() {
    let mut sim = simulation(&["..."], 1);
    let unit = sim
        .spawn_unit("Mage", Team::Player, policy_for("objective"), tile(0, 1))
        .expect("unit");
    assert_eq!(sim.policy_name(unit), Some("objective"));

    assert!(sim.remove_unit(unit));
    assert_eq!(sim.policy_name(unit), None);
    assert!(sim.is_walkable(tile(0, 1)));
    assert_eq!(sim.tile_at(tile(0, 1)).map(|found| found.position), Some(tile(0, 1)));
}

#[test]
fn manual_damage_kills_and_reports() {
    let mut sim = simulation(&[".."], 1);
    let unit = sim
        .spawn_unit("Mage", Team::Enemy, Box::new(Hold), tile(0, 0))
        .expect("unit");

    let events = sim.apply_damage(unit, 5);

    assert!(events.contains(&Event::UnitDied {
        unit,
        tile: tile(0, 0),
    }));
    assert!(sim.unit_at(tile(0, 0)).is_none());
}

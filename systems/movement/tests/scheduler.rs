use std::{cell::RefCell, rc::Rc};

use tactica_core::{Command, Event, Team, TilePosition, UnitId, UnitPlan, UnitState};
use tactica_system_ai::{
    cost::{RouteCost, OPEN_TILE_COST, RESERVED_TILE_COST},
    PolicyContext, UnitPolicy,
};
use tactica_system_movement::Movement;
use tactica_world::{self as world, query, Catalog, TileMap, World};

fn tile(row: i32, col: i32) -> TilePosition {
    TilePosition::new(row, col)
}

/// Always asks for the same tile.
#[derive(Debug)]
struct Claim(TilePosition);

impl UnitPolicy for Claim {
    fn name(&self) -> &'static str {
        "claim"
    }

    fn decide(&mut self, _ctx: &PolicyContext<'_>, plan: &mut UnitPlan) -> Option<TilePosition> {
        plan.state = UnitState::Moving;
        plan.current_goal = Some(self.0);
        Some(self.0)
    }
}

/// Records what stepping onto each tile would cost, then stays put.
#[derive(Debug)]
struct Quote {
    tiles: Vec<TilePosition>,
    prices: Rc<RefCell<Vec<u32>>>,
}

impl UnitPolicy for Quote {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn decide(&mut self, ctx: &PolicyContext<'_>, plan: &mut UnitPlan) -> Option<TilePosition> {
        let pricing = RouteCost::new(ctx.world(), ctx.unit(), false, ctx.reserved());
        self.prices
            .borrow_mut()
            .extend(self.tiles.iter().map(|tile| pricing.cost(*tile)));
        plan.state = UnitState::Idle;
        None
    }
}

fn spawn(world: &mut World, team: Team, position: TilePosition) -> UnitId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnUnit {
            kind: "Warrior".to_owned(),
            team,
            tile: position,
        },
        &mut events,
    );
    events
        .iter()
        .find_map(|event| match event {
            Event::UnitSpawned { unit, .. } => Some(*unit),
            _ => None,
        })
        .expect("spawn succeeds")
}

fn apply_all(world: &mut World, commands: &mut Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands.drain(..) {
        world::apply(world, command, &mut events);
    }
    events
}

fn run_tick(world: &mut World, movement: &mut Movement) -> Vec<Event> {
    let mut events = Vec::new();
    movement.snapshot_reservations(world);
    world::apply(world, Command::Tick, &mut events);
    let mut commands = Vec::new();
    movement.collect_requests(world, &mut commands);
    events.extend(apply_all(world, &mut commands));
    movement.resolve_requests(world, &mut commands);
    events.extend(apply_all(world, &mut commands));
    movement.snapshot_reservations(world);
    events
}

#[test]
fn contested_tile_admits_exactly_one_unit() {
    for seed in 0..16 {
        let mut world = World::new(TileMap::new(3, 3), Catalog::builtin());
        let north = spawn(&mut world, Team::Player, tile(0, 1));
        let west = spawn(&mut world, Team::Player, tile(1, 0));
        let mut movement = Movement::new(seed);
        movement.assign_policy(north, Box::new(Claim(tile(1, 1))));
        movement.assign_policy(west, Box::new(Claim(tile(1, 1))));

        let events = run_tick(&mut world, &mut movement);

        let moved: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                Event::UnitMoved { unit, to, .. } => Some((*unit, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(moved.len(), 1, "seed {seed}: {events:?}");
        let (winner, destination) = moved[0];
        assert_eq!(destination, tile(1, 1));

        let loser = if winner == north { west } else { north };
        let loser_record = query::unit(&world, loser).expect("loser");
        assert!(loser_record.plan.needs_repath);
        assert_eq!(loser_record.plan.current_goal, Some(tile(1, 1)));
        let expected_start = if loser == north { tile(0, 1) } else { tile(1, 0) };
        assert_eq!(loser_record.position, expected_start);
        assert!(events.contains(&Event::MoveContested {
            unit: loser,
            destination: tile(1, 1),
        }));
    }
}

#[test]
fn conflict_winner_follows_seed() {
    let outcome = |seed: u64| {
        let mut world = World::new(TileMap::new(3, 3), Catalog::builtin());
        let north = spawn(&mut world, Team::Player, tile(0, 1));
        let west = spawn(&mut world, Team::Player, tile(1, 0));
        let mut movement = Movement::new(seed);
        movement.assign_policy(north, Box::new(Claim(tile(1, 1))));
        movement.assign_policy(west, Box::new(Claim(tile(1, 1))));
        let _ = run_tick(&mut world, &mut movement);
        query::unit_at(&world, tile(1, 1)).map(|unit| unit.id)
    };

    for seed in [1, 9, 42] {
        assert_eq!(outcome(seed), outcome(seed));
    }
}

#[test]
fn occupied_destination_rejects_all_and_clears_matching_goals() {
    let mut world = World::new(TileMap::new(3, 3), Catalog::builtin());
    let north = spawn(&mut world, Team::Player, tile(0, 1));
    let west = spawn(&mut world, Team::Player, tile(1, 0));
    let _squatter = spawn(&mut world, Team::Enemy, tile(1, 1));
    let mut movement = Movement::default();
    movement.assign_policy(north, Box::new(Claim(tile(1, 1))));
    movement.assign_policy(west, Box::new(Claim(tile(1, 1))));

    let events = run_tick(&mut world, &mut movement);

    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::UnitMoved { .. })));
    for unit in [north, west] {
        let record = query::unit(&world, unit).expect("unit");
        assert!(record.plan.needs_repath);
        assert_eq!(record.plan.current_goal, None);
    }
}

#[test]
fn wall_destination_is_rejected() {
    let mut world = World::new(TileMap::from_ascii(&[".#"]), Catalog::builtin());
    let unit = spawn(&mut world, Team::Player, tile(0, 0));
    let mut movement = Movement::default();
    movement.assign_policy(unit, Box::new(Claim(tile(0, 1))));

    let events = run_tick(&mut world, &mut movement);

    assert!(events.contains(&Event::MoveContested {
        unit,
        destination: tile(0, 1),
    }));
    assert_eq!(query::unit(&world, unit).map(|u| u.position), Some(tile(0, 0)));
}

#[test]
fn cooling_down_units_are_not_polled() {
    let mut world = World::new(TileMap::new(1, 5), Catalog::builtin());
    let unit = spawn(&mut world, Team::Player, tile(0, 0));
    let mut movement = Movement::default();
    movement.assign_policy(unit, Box::new(Claim(tile(0, 1))));

    let first = run_tick(&mut world, &mut movement);
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::UnitMoved { .. })));
    assert_eq!(query::unit(&world, unit).map(|u| u.movement_cooldown), Some(2));

    for _ in 0..2 {
        movement.snapshot_reservations(&world);
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick, &mut events);
        let mut commands = Vec::new();
        movement.collect_requests(&world, &mut commands);
        assert!(commands.is_empty());
        assert!(movement.pending_requests().is_empty());
    }
}

#[test]
fn vacated_tiles_stay_reserved_until_the_tick_ends() {
    let mut world = World::new(TileMap::new(1, 3), Catalog::builtin());
    let leader = spawn(&mut world, Team::Player, tile(0, 1));
    let follower = spawn(&mut world, Team::Player, tile(0, 0));
    let mut movement = Movement::default();
    movement.assign_policy(leader, Box::new(Claim(tile(0, 2))));
    movement.assign_policy(follower, Box::new(Claim(tile(0, 1))));

    let _ = run_tick(&mut world, &mut movement);

    assert_eq!(query::unit(&world, leader).map(|u| u.position), Some(tile(0, 2)));
    assert_eq!(query::unit(&world, follower).map(|u| u.position), Some(tile(0, 0)));
    assert!(movement.reserved_tiles().contains(&tile(0, 2)));
    assert!(!movement.reserved_tiles().contains(&tile(0, 1)));
}

#[test]
fn occupancy_matches_unit_positions_after_every_tick() {
    let layout = ["O....", ".....", "..#..", ".....", "....O"];
    let mut world = World::new(TileMap::from_ascii(&layout), Catalog::builtin());
    let mut movement = Movement::new(5);
    let starts = [tile(0, 4), tile(4, 0), tile(2, 0), tile(2, 4), tile(1, 2), tile(3, 2)];
    for (index, start) in starts.into_iter().enumerate() {
        let unit = spawn(&mut world, Team::Player, start);
        let policy = if index % 2 == 0 { "attack" } else { "objective" };
        movement.assign_policy(unit, tactica_system_ai::policy_for(policy));
    }

    for _ in 0..30 {
        let _ = run_tick(&mut world, &mut movement);
        let occupancy = query::occupancy(&world);
        assert_eq!(occupancy.occupied_count(), query::unit_count(&world));
        for unit in query::units(&world) {
            assert_eq!(
                query::occupant(&world, unit.position),
                Some(tactica_core::Occupant::Unit(unit.id))
            );
        }
    }
}

#[test]
fn later_policies_price_tiles_claimed_earlier_in_the_tick() {
    let mut world = World::new(TileMap::new(3, 3), Catalog::builtin());
    let claimer = spawn(&mut world, Team::Player, tile(0, 1));
    let quoter = spawn(&mut world, Team::Player, tile(2, 1));
    let prices = Rc::new(RefCell::new(Vec::new()));
    let mut movement = Movement::new(5);
    movement.assign_policy(claimer, Box::new(Claim(tile(1, 1))));
    movement.assign_policy(
        quoter,
        Box::new(Quote {
            tiles: vec![tile(1, 1), tile(1, 2)],
            prices: Rc::clone(&prices),
        }),
    );

    let _ = run_tick(&mut world, &mut movement);

    assert_eq!(*prices.borrow(), vec![RESERVED_TILE_COST, OPEN_TILE_COST]);
    assert_eq!(query::unit(&world, claimer).map(|unit| unit.position), Some(tile(1, 1)));
    assert!(!movement.reserved_tiles().contains(&tile(0, 1)));
}

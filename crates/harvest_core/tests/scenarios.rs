//! End-to-end turn scenarios.

use harvest_core::prelude::*;
use harvest_test_utils::determinism::{run_parallel_replays, strategies, verify_turn_determinism};
use harvest_test_utils::fixtures::{fixed, scoreboard, turn_input, BoardBuilder};
use harvest_test_utils::proptest::prelude::*;
use harvest_test_utils::selection::{FixedIndex, ScriptedSelection};

const ME: PlayerId = 0;
const RIVAL: PlayerId = 1;

fn config_with_deposit(deposit: u32) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.strategy.deposit_cargo = deposit;
    config
}

/// Where a unit ends up if its action is carried out.
fn destination(board: &BoardSnapshot, unit: &Unit, action: UnitAction) -> Position {
    match action {
        UnitAction::Move(d) => board.geometry().step(unit.position, d),
        UnitAction::Hold | UnitAction::Convert => unit.position,
    }
}

#[test]
fn lone_hot_cell_draws_the_unit_east() {
    let mut builder = BoardBuilder::new(5);
    builder.resource(2, 0, 100);
    let id = builder.unit(ME, 0, 0, 0);
    let board = builder.build();

    let unit = *board.unit(id).unwrap();
    let scanner = PerceptionScanner::new(&board, ME, ResourceEstimator::default(), true);
    let radar = scanner.scan_unit(&unit, 2).unwrap();
    assert_eq!(radar.best_cells(), vec![Position::new(2, 0)]);

    let input = turn_input(board, ME, 10, scoreboard(&[(ME, 0)]));
    let mut orchestrator = TurnOrchestrator::new(config_with_deposit(500), FixedIndex(0));
    let report = orchestrator.play_turn(&input).unwrap();

    assert_eq!(
        report.unit_action(id),
        Some(UnitAction::Move(Direction::East))
    );
    assert_eq!(report.states[&id], UnitState::Explore);
}

#[test]
fn full_cargo_turns_home_the_same_turn() {
    let mut builder = BoardBuilder::new(7);
    builder.fill(10);
    builder.base(ME, 5, 3);
    builder.base(ME, 0, 0);
    let id = builder.unit(ME, 3, 3, 600);
    let input = turn_input(builder.build(), ME, 10, scoreboard(&[(ME, 0)]));

    let mut orchestrator = TurnOrchestrator::new(config_with_deposit(500), FixedIndex(0));
    let report = orchestrator.play_turn(&input).unwrap();

    assert_eq!(report.states[&id], UnitState::Deposit);
    assert_eq!(
        report.unit_action(id),
        Some(UnitAction::Move(Direction::East))
    );
}

#[test]
fn reserved_cell_is_not_safe_for_the_next_ally() {
    let mut builder = BoardBuilder::new(5);
    let first = builder.unit(ME, 0, 0, 0);
    let second = builder.unit(ME, 1, 1, 0);
    let board = builder.build();
    let a = *board.unit(first).unwrap();
    let b = *board.unit(second).unwrap();
    let target = Position::new(1, 0);

    let planner = MovementPlanner::new(
        &board,
        ME,
        MovementConfig::default(),
        GameConstants::default().convert_cost(),
    );
    let mut ledger = TurnLedger::new(board.geometry(), Fixed::ZERO);
    let mut policy = FixedIndex(0);

    assert_eq!(
        planner.classify(&b, Direction::South, &ledger).unwrap(),
        StepClass::Safe
    );

    let step = planner.navigate(&a, target, &mut ledger, &mut policy).unwrap();
    assert_eq!(step.action, UnitAction::Move(Direction::East));
    assert!(ledger.reservations().is_claimed(target));

    assert_ne!(
        planner.classify(&b, Direction::South, &ledger).unwrap(),
        StepClass::Safe
    );
    let step = planner.navigate(&b, target, &mut ledger, &mut policy).unwrap();
    assert_ne!(step.action, UnitAction::Move(Direction::South));
}

#[test]
fn contested_cell_detour_when_the_wait_roll_fails() {
    let mut builder = BoardBuilder::new(5);
    let first = builder.unit(ME, 0, 0, 0);
    let second = builder.unit(ME, 1, 1, 0);
    let board = builder.build();
    let a = *board.unit(first).unwrap();
    let b = *board.unit(second).unwrap();
    let target = Position::new(1, 0);

    let planner = MovementPlanner::new(
        &board,
        ME,
        MovementConfig::default(),
        GameConstants::default().convert_cost(),
    );
    let mut ledger = TurnLedger::new(board.geometry(), Fixed::ZERO);
    planner
        .navigate(&a, target, &mut ledger, &mut FixedIndex(0))
        .unwrap();

    // Roll 99 is above the wait chance, then take the first sidestep
    let mut policy = ScriptedSelection::new([99, 0]);
    let step = planner.navigate(&b, target, &mut ledger, &mut policy).unwrap();
    assert_eq!(step.kind, StepKind::Detour);
    let landing = board.geometry().step(b.position, match step.action {
        UnitAction::Move(d) => d,
        other => panic!("expected a move, got {other}"),
    });
    assert_ne!(landing, target);
    assert!(ledger.reservations().is_claimed(landing));
    // One wait roll, then one choice among the sidesteps
    assert_eq!(policy.asked().len(), 2);
    assert_eq!(policy.asked()[0], 100);
    assert_eq!(policy.remaining(), 0);
}

#[test]
fn bootstrap_converts_the_unit_on_the_poorer_cell() {
    let mut builder = BoardBuilder::new(9);
    builder.resource(1, 1, 20).resource(6, 6, 10);
    let rich = builder.unit(ME, 1, 1, 0);
    let poor = builder.unit(ME, 6, 6, 0);
    let input = turn_input(builder.build(), ME, 5, scoreboard(&[(ME, 1000)]));

    let mut orchestrator = TurnOrchestrator::new(EngineConfig::default(), FixedIndex(0));
    let report = orchestrator.play_turn(&input).unwrap();

    assert_eq!(report.unit_action(poor), Some(UnitAction::Convert));
    assert_ne!(report.unit_action(rich), Some(UnitAction::Convert));
    assert_eq!(report.states[&poor], UnitState::Convert);
}

#[test]
fn missing_score_still_moves_units() {
    let mut builder = BoardBuilder::new(5);
    builder.resource(2, 0, 100);
    builder.base(ME, 4, 4);
    let id = builder.unit(ME, 0, 0, 0);
    let input = turn_input(builder.build(), ME, 10, scoreboard(&[(RIVAL, 700)]));

    let mut orchestrator = TurnOrchestrator::new(EngineConfig::default(), FixedIndex(0));
    let report = orchestrator.play_turn(&input).unwrap();

    assert!(report.scheduling_error.is_some());
    assert_eq!(report.actions.spawn_count(), 0);
    assert!(report.unit_action(id).is_some());
}

#[test]
fn threat_rule_is_configurable_from_ron() {
    let config = EngineConfig::from_ron_str(
        "(movement: (threat_rule: DistanceDiscounted(margin_per_step: 50)))",
    )
    .unwrap();
    assert_eq!(
        config.movement.threat_rule,
        ThreatRule::DistanceDiscounted { margin_per_step: 50 }
    );
    assert_eq!(config.strategy, StrategyConfig::default());
}

#[test]
fn seeded_games_replay_identically() {
    let mut builder = BoardBuilder::new(11);
    builder.fill(30);
    builder.resource(5, 5, 400).resource(2, 8, 350).resource(9, 1, 500);
    builder.base(ME, 3, 3);
    builder.base(RIVAL, 8, 8);
    builder.unit(ME, 3, 4, 0);
    builder.unit(ME, 4, 3, 200);
    builder.unit(ME, 2, 2, 80);
    builder.unit(RIVAL, 7, 8, 0);
    builder.unit(RIVAL, 8, 7, 350);
    let input = turn_input(
        builder.build(),
        ME,
        50,
        scoreboard(&[(ME, 2000), (RIVAL, 1500)]),
    );

    for seed in [0, 1, 99] {
        verify_turn_determinism(EngineConfig::default(), seed, &input, 3, 20).assert_deterministic();
    }
    run_parallel_replays(EngineConfig::default(), 5, &input, 4, 20).assert_deterministic();
}

#[test]
fn oversized_thresholds_are_rejected_and_never_panic() {
    assert!(matches!(
        EngineConfig::from_ron_str("(strategy: (deposit_cargo: 3000000000))"),
        Err(EngineError::InvalidConfig(_))
    ));

    // Built in code, the same value skips validation but must still play
    let mut builder = BoardBuilder::new(5);
    builder.resource(2, 0, 100);
    let id = builder.unit(ME, 0, 0, 0);
    let input = turn_input(builder.build(), ME, 10, scoreboard(&[(ME, 0)]));
    let mut config = config_with_deposit(3_000_000_000);
    config.strategy.expansion_resource = u32::MAX;
    config.movement.threat_rule = ThreatRule::DistanceDiscounted {
        margin_per_step: u32::MAX,
    };

    let mut orchestrator = TurnOrchestrator::new(config, FixedIndex(0));
    let report = orchestrator.play_turn(&input).unwrap();
    assert_eq!(
        report.unit_action(id),
        Some(UnitAction::Move(Direction::East))
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn no_two_own_entities_land_on_one_cell(
        board in strategies::arb_board(7, 12, 4),
        seed in any::<u64>(),
        turn in 0u32..400u32,
        bank in 0i32..3000i32,
    ) {
        let input = turn_input(board, ME, turn, scoreboard(&[(ME, bank), (RIVAL, 1000)]));
        let mut orchestrator =
            TurnOrchestrator::new(EngineConfig::default(), SeededSelection::new(seed));
        let report = orchestrator.play_turn(&input).unwrap();
        let board = &input.snapshot;

        prop_assert_eq!(report.actions.units.len(), board.units_of(ME).count());
        prop_assert_eq!(report.actions.bases.len(), board.bases_of(ME).count());

        let mut landed = std::collections::BTreeSet::new();
        for unit in board.units_of(ME) {
            let action = report.actions.units[&unit.id];
            if action == UnitAction::Convert {
                continue;
            }
            prop_assert!(landed.insert(destination(board, unit, action)));
        }
        for base in board.bases_of(ME) {
            if report.actions.bases[&base.id] == BaseAction::Spawn {
                prop_assert!(landed.insert(base.position));
            }
        }
    }

    #[test]
    fn spawning_never_overdraws_the_bank(
        board in strategies::arb_board(7, 6, 4),
        turn in 0u32..380u32,
        bank in 0i32..3000i32,
    ) {
        let input = turn_input(board, ME, turn, scoreboard(&[(ME, bank), (RIVAL, 1000)]));
        let mut orchestrator = TurnOrchestrator::new(EngineConfig::default(), FixedIndex(0));
        let report = orchestrator.play_turn(&input).unwrap();

        let spent = fixed(i32::try_from(report.actions.spawn_count()).unwrap() * 500);
        prop_assert!(spent <= fixed(bank));
    }
}

//! Property tests for the occupancy set, presence edges and the door state
//! machine.

use barn_gate::config::{DoorConfig, CLOSED_POSITION, OCCUPANCY_CAPACITY, OPEN_POSITION};
use barn_gate::hal::MockStepper;
use barn_gate::{
    BarnOccupancy, DoorController, DoorOutcome, DoorState, FaultKind, OccupancyChange, Presence,
    PresenceEdge,
};
use proptest::prelude::*;

// ── Occupancy ─────────────────────────────────────────────────

const NAMES: [&str; 14] = [
    "Bron", "TFrance", "Clover", "Juniper", "Pepper", "Hazel", "Maple", "Olive", "Sage", "Thyme",
    "Willow", "Basil", "Fern", "Ivy",
];

#[derive(Debug, Clone)]
enum OccupancyOp {
    Add(usize),
    Remove(usize),
}

fn arb_occupancy_op() -> impl Strategy<Value = OccupancyOp> {
    prop_oneof![
        (0..NAMES.len()).prop_map(OccupancyOp::Add),
        (0..NAMES.len()).prop_map(OccupancyOp::Remove),
    ]
}

proptest! {
    /// The set behaves like an ordered, duplicate-free, bounded list.
    #[test]
    fn occupancy_matches_model(ops in proptest::collection::vec(arb_occupancy_op(), 0..200)) {
        let mut barn = BarnOccupancy::new();
        let mut model: Vec<&str> = Vec::new();

        for op in ops {
            match op {
                OccupancyOp::Add(i) => {
                    let name = NAMES[i];
                    let change = barn.add_if_absent(name);
                    if model.contains(&name) {
                        prop_assert_eq!(change, OccupancyChange::AlreadyPresent);
                    } else if model.len() == OCCUPANCY_CAPACITY {
                        prop_assert_eq!(change, OccupancyChange::Full);
                    } else {
                        prop_assert_eq!(change, OccupancyChange::Added);
                        model.push(name);
                    }
                }
                OccupancyOp::Remove(i) => {
                    let name = NAMES[i];
                    let change = barn.remove_if_present(name);
                    if let Some(pos) = model.iter().position(|n| *n == name) {
                        prop_assert_eq!(change, OccupancyChange::Removed);
                        model.remove(pos);
                    } else {
                        prop_assert_eq!(change, OccupancyChange::NotPresent);
                    }
                }
            }

            prop_assert!(barn.len() <= OCCUPANCY_CAPACITY);
            let names: Vec<&str> = barn.iter().collect();
            prop_assert_eq!(&names, &model);

            let snapshot = barn.snapshot();
            prop_assert_eq!(snapshot.count(), model.len());
        }
    }
}

// ── Presence edges ────────────────────────────────────────────

proptest! {
    /// Arrivals and departures alternate, starting with an arrival, and
    /// one arrival fires per absent-to-present transition.
    #[test]
    fn presence_edges_alternate(reads in proptest::collection::vec(any::<bool>(), 0..300)) {
        let mut presence = Presence::default();
        let mut previous = false;
        let mut expected_arrivals = 0usize;
        let mut arrivals = 0usize;
        let mut departures = 0usize;

        for detected in reads {
            if detected && !previous {
                expected_arrivals += 1;
            }
            match presence.observe(detected) {
                Some(PresenceEdge::Arrived) => {
                    prop_assert!(detected);
                    arrivals += 1;
                }
                Some(PresenceEdge::Departed) => {
                    prop_assert!(!detected);
                    departures += 1;
                }
                None => prop_assert_eq!(detected, previous),
            }
            prop_assert!(arrivals - departures <= 1);
            previous = detected;
        }

        prop_assert_eq!(arrivals, expected_arrivals);
    }
}

// ── Door state machine ────────────────────────────────────────

#[derive(Debug, Clone)]
enum DoorOp {
    Open(bool),
    Close,
    Tick(u64),
    Fault,
    Clear,
}

fn arb_door_op() -> impl Strategy<Value = DoorOp> {
    prop_oneof![
        any::<bool>().prop_map(DoorOp::Open),
        Just(DoorOp::Close),
        (1u64..=4_000).prop_map(DoorOp::Tick),
        Just(DoorOp::Fault),
        Just(DoorOp::Clear),
    ]
}

proptest! {
    /// Arbitrary command sequences keep the door within its travel, report
    /// closed only when shut, and keep the state consistent with the manual
    /// latch and the move counter.
    #[test]
    fn door_invariants(
        steps_per_run in 1u32..=2_500,
        ops in proptest::collection::vec(arb_door_op(), 0..150),
    ) {
        let stepper = MockStepper::new().with_steps_per_run(steps_per_run);
        let mut door = DoorController::new(stepper, DoorConfig::default()).unwrap();
        let mut now = 0u64;
        let mut accepted_opens = 0u32;

        for op in ops {
            let before = door.state();
            match op {
                DoorOp::Open(manual) => {
                    if door.request_open(manual, now).unwrap() == DoorOutcome::Accepted {
                        prop_assert!(matches!(before, DoorState::Idle | DoorState::ManualOpen));
                        accepted_opens += 1;
                    } else {
                        prop_assert_eq!(door.state(), before);
                    }
                }
                DoorOp::Close => {
                    if door.request_close(now).unwrap() == DoorOutcome::Accepted {
                        prop_assert_eq!(door.state(), DoorState::Closing);
                    } else {
                        prop_assert!(matches!(before, DoorState::Idle | DoorState::Error));
                    }
                }
                DoorOp::Tick(ms) => {
                    now += ms;
                    let after = door.update(now).unwrap();
                    if before == DoorState::Closing && after == DoorState::Idle {
                        prop_assert_eq!(door.position(), CLOSED_POSITION);
                    }
                    if after == DoorState::OpenHolding || after == DoorState::ManualOpen {
                        prop_assert_eq!(door.position(), OPEN_POSITION);
                    }
                }
                DoorOp::Fault => {
                    door.inject_fault(FaultKind::External).unwrap();
                    prop_assert_eq!(door.state(), DoorState::Error);
                }
                DoorOp::Clear => {
                    let cleared = door.clear_fault(now).unwrap();
                    prop_assert_ne!(cleared, DoorState::Error);
                }
            }

            let position = door.position();
            prop_assert!((CLOSED_POSITION..=OPEN_POSITION).contains(&position));
            if door.state() == DoorState::Idle {
                prop_assert_eq!(position, CLOSED_POSITION);
            }
            if door.is_manual_hold() {
                prop_assert!(matches!(door.state(), DoorState::Opening | DoorState::ManualOpen));
            }
            if door.state() == DoorState::ManualOpen {
                prop_assert!(door.is_manual_hold());
            }
            prop_assert_eq!(door.has_fault(), door.state() == DoorState::Error);
            prop_assert_eq!(door.stats().moves, accepted_opens);
        }
    }
}

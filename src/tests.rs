use crate::*;

use crate::input::layout::{LayoutNames, PointPosition, SignalAspect, StationLayout};
use crate::output::history::{Category, StationLogEvent};
use crate::station::control::TrainControl;
use crate::station::movement::{Direction, TrainDesc, TrainPosition, TrainStatus};
use crate::station::random::{NoDepartures, SeededDepartures};
use crate::station::registry::Change;
use crate::station::CommandError;

/// One terminus with three routed platforms and no points: the simplest
/// layout where scheduling decisions are visible.
fn terminus() -> (StationLayout, LayoutNames<String>) {
    get_layout_string(
        r#"
        station NGP "Nagpur Jn" km=10.0 platforms=3 tracks=3
        signal NGP H1 home red
        signal NGP H2 home red
        signal NGP H3 home red
        signal NGP S1 starter red
        signal NGP S2 starter red
        signal NGP S3 starter red
        route NGP 1 home=H1 starter=S1
        route NGP 2 home=H2 starter=S2
        route NGP 3 home=H3 starter=S3
    "#,
    )
    .unwrap()
}

/// Same terminus, but the single platform route needs a point that is
/// locked in the wrong position, so no route can ever be established.
fn dead_end() -> (StationLayout, LayoutNames<String>) {
    get_layout_string(
        r#"
        station NGP "Nagpur Jn" km=10.0 platforms=1 tracks=1
        point NGP P101A reverse locked
        signal NGP H1 home red
        signal NGP S1 starter red
        route NGP 1 home=H1 starter=S1 points=P101A:normal
    "#,
    )
    .unwrap()
}

fn express(number: &str, priority: u8) -> TrainDesc {
    TrainDesc {
        number: number.to_string(),
        name: format!("Test {}", number),
        priority: priority,
        max_speed: 60.0,
        direction: Direction::Up,
    }
}

fn train_position(control: &TrainControl, id: usize) -> TrainPosition {
    control.trains[id].as_ref().unwrap().position.clone()
}

#[test]
fn train_runs_in_and_stops() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    let t = control.enter_train(&express("12621", 2));

    for _ in 0..10 {
        control.tick();
    }

    match train_position(&control, t) {
        TrainPosition::AtPlatform { platform, .. } => assert_eq!(platform, 0),
        other => panic!("expected train at platform, got {:?}", other),
    }
    assert_eq!(control.trains[t].as_ref().unwrap().status, TrainStatus::Stopped);
    assert_eq!(control.registry.platforms[0].occupant, Some(t));
    // The home signal went back to danger behind the train.
    assert_eq!(control.registry.signals[0].aspect, SignalAspect::Red);
    assert!(control
        .log
        .records()
        .iter()
        .any(|r| r.event == StationLogEvent::TrainArrived { train: t, platform: 0 }));
}

#[test]
fn priority_override_takes_the_freed_platform() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    // All three platforms are busy when the trains show up.
    control.registry.occupy_platform(0, 100);
    control.registry.occupy_platform(1, 101);
    control.registry.occupy_platform(2, 102);

    let a = control.enter_train(&express("12859", 2));
    control.tick();
    let b = control.enter_train(&express("12289", 1));
    control.tick();

    // Platform 3 frees up while both trains are still queued.
    control.registry.release_platform(2);
    let events = control.tick();

    let a_train = control.trains[a].as_ref().unwrap();
    let b_train = control.trains[b].as_ref().unwrap();
    assert_eq!(b_train.assignment, Some(2), "the later, higher-priority train wins");
    assert_eq!(a_train.assignment, None, "the earlier train keeps waiting");
    assert!(events
        .iter()
        .any(|r| r.event == StationLogEvent::PlatformAssigned { train: b, platform: 2 }));
}

#[test]
fn equal_priority_is_first_come_first_served() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    control.registry.occupy_platform(0, 100);
    control.registry.occupy_platform(1, 101);
    control.registry.occupy_platform(2, 102);

    let a = control.enter_train(&express("12621", 2));
    control.tick();
    let b = control.enter_train(&express("22691", 2));
    control.tick();

    control.registry.release_platform(0);
    control.tick();

    assert_eq!(control.trains[a].as_ref().unwrap().assignment, Some(0));
    assert_eq!(control.trains[b].as_ref().unwrap().assignment, None);
}

#[test]
fn blocked_train_holds_short_of_the_station() {
    let (layout, names) = dead_end();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    let t = control.enter_train(&express("12130", 1));

    for _ in 0..8 {
        control.tick();
    }
    let held_at = train_position(&control, t);
    let held_speed = control.trains[t].as_ref().unwrap().speed;

    for _ in 0..5 {
        control.tick();
        assert_eq!(train_position(&control, t), held_at, "no silent teleport");
        assert_eq!(control.trains[t].as_ref().unwrap().speed, 0.0);
    }
    assert_eq!(held_speed, 0.0);

    // One block event per episode, not one per tick.
    let blocks = control
        .log
        .records()
        .iter()
        .filter(|r| match r.event {
            StationLogEvent::SectionBlocked { train, .. } => train == t,
            _ => false,
        })
        .count();
    assert_eq!(blocks, 1);
}

#[test]
fn signal_back_to_danger_holds_the_train() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    let t = control.enter_train(&express("12442", 1));

    // Let the scheduler grant the route, then drop the home signal.
    control.tick();
    assert_eq!(control.trains[t].as_ref().unwrap().assignment, Some(0));
    assert_eq!(control.registry.signals[0].aspect, SignalAspect::Green);
    assert_eq!(control.set_signal("NGP", "H1", SignalAspect::Red), Ok(Change::Updated));

    for _ in 0..10 {
        control.tick();
    }
    assert_eq!(control.trains[t].as_ref().unwrap().speed, 0.0);
    assert!(matches!(train_position(&control, t), TrainPosition::OnLine { .. }));

    // Clearing the signal again releases the train.
    assert_eq!(control.set_signal("NGP", "H1", SignalAspect::Green), Ok(Change::Updated));
    control.tick();
    assert!(matches!(
        train_position(&control, t),
        TrainPosition::AtPlatform { platform: 0, .. }
    ));
}

#[test]
fn cleared_signal_implies_aligned_points() {
    let (layout, names) = get_layout_string(
        r#"
        station NGP "Nagpur Jn" km=10.0 platforms=2 tracks=2
        point NGP P101A reverse
        signal NGP H1 home red
        signal NGP S1 starter red
        signal NGP H2 home red
        signal NGP S2 starter red
        route NGP 1 home=H1 starter=S1 points=P101A:normal
        route NGP 2 home=H2 starter=S2 points=P101A:reverse
    "#,
    )
    .unwrap();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    control.enter_train(&express("12649", 2));
    control.tick();

    // Whatever the scheduler granted, every green signal's route must have
    // its points in the required position right now.
    for (sig, state) in control.registry.signals.iter().enumerate() {
        if state.aspect == SignalAspect::Green {
            let route = layout.route_of_signal(sig).unwrap();
            for &(p, pos) in route.points.iter() {
                assert_eq!(control.registry.points[p].position, pos);
            }
        }
    }
    // And the scheduler did move the point to serve platform 1.
    assert_eq!(control.registry.points[0].position, PointPosition::Normal);
}

#[test]
fn platform_exclusivity_holds_every_tick() {
    let (layout, names) = get_layout_string(
        r#"
        station NGP "Nagpur Jn" km=10.0 platforms=2 tracks=2
        signal NGP H1 home red
        signal NGP H2 home red
        signal NGP S1 starter red
        signal NGP S2 starter red
        route NGP 1 home=H1 starter=S1
        route NGP 2 home=H2 starter=S2
    "#,
    )
    .unwrap();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    control.enter_train(&express("16032", 3));
    control.enter_train(&express("12860", 2));
    control.enter_train(&express("12724", 1));

    for _ in 0..30 {
        control.tick();
        for platform in 0..control.registry.platforms.len() {
            let stopped_here = control
                .trains
                .iter()
                .filter_map(|slot| slot.as_ref())
                .filter(|t| {
                    t.position == TrainPosition::AtPlatform { station: 0, platform: platform }
                })
                .count();
            assert!(stopped_here <= 1, "two trains on platform {}", platform);
            // The registry's occupancy agrees with the trains' own positions.
            if stopped_here == 0 {
                assert_eq!(control.registry.platforms[platform].occupant, None);
            }
        }
    }

    // Two trains are berthed, the third is still queued outside.
    let stopped = control
        .trains
        .iter()
        .filter_map(|slot| slot.as_ref())
        .filter(|t| t.status == TrainStatus::Stopped)
        .count();
    assert_eq!(stopped, 2);
}

#[test]
fn signal_command_is_idempotent() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));

    assert_eq!(control.set_signal("NGP", "S3", SignalAspect::Yellow), Ok(Change::Updated));
    let len_after_first = control.log.len();
    assert_eq!(control.set_signal("NGP", "S3", SignalAspect::Yellow), Ok(Change::Unchanged));
    assert_eq!(control.log.len(), len_after_first, "no duplicate change event");
}

#[test]
fn snapshot_reflects_exactly_the_mutation() {
    let (layout, names) = get_layout_string(
        r#"
        station NGP "Nagpur Jn" km=10.0 platforms=1 tracks=1
        point NGP P102A normal
        point NGP P102B normal
        signal NGP H1 home red
        signal NGP S1 starter red
        route NGP 1 home=H1 starter=S1
    "#,
    )
    .unwrap();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    let before = control.snapshot("NGP").unwrap();

    control.set_point("NGP", "P102A", PointPosition::Reverse).unwrap();
    let after = control.snapshot("NGP").unwrap();

    assert_eq!(after.points[0].1.position, PointPosition::Reverse);
    assert_eq!(after.points[1], before.points[1], "the other point is untouched");
    assert_eq!(after.signals, before.signals);
    assert_eq!(after.platforms, before.platforms);
}

#[test]
fn unknown_entities_are_rejected_and_logged() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));

    match control.set_point("NGP", "P999", PointPosition::Reverse) {
        Err(CommandError::UnknownEntity(_)) => {}
        other => panic!("expected unknown entity, got {:?}", other),
    }
    match control.set_signal("WR", "H1", SignalAspect::Green) {
        Err(CommandError::UnknownEntity(_)) => {}
        other => panic!("expected unknown station, got {:?}", other),
    }
    let rejected = control
        .log
        .records()
        .iter()
        .filter(|r| matches!(r.event, StationLogEvent::CommandRejected(_)))
        .count();
    assert_eq!(rejected, 2);
}

#[test]
fn emergency_stop_drops_every_signal() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    control.set_signal("NGP", "H1", SignalAspect::Green).unwrap();
    control.set_signal("NGP", "S2", SignalAspect::Yellow).unwrap();

    let changed = control.emergency_stop("NGP").unwrap();
    assert_eq!(changed, 2);
    assert!(control
        .registry
        .signals
        .iter()
        .all(|s| s.aspect == SignalAspect::Red));
    assert!(control
        .log
        .records()
        .iter()
        .any(|r| r.category == Category::Emergency));
}

#[test]
fn locked_points_refuse_operator_commands() {
    let (layout, names) = dead_end();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    match control.set_point("NGP", "P101A", PointPosition::Normal) {
        Err(CommandError::ResourceLocked(what)) => assert!(what.contains("P101A")),
        other => panic!("expected resource locked, got {:?}", other),
    }
    assert_eq!(control.registry.points[0].position, PointPosition::Reverse);
}

#[test]
fn lock_all_points_is_an_emergency_command() {
    let (layout, names) = get_layout_string(
        r#"
        station NGP "Nagpur Jn" km=10.0 platforms=1 tracks=1
        point NGP P102A normal
        signal NGP H1 home red
        signal NGP S1 starter red
        route NGP 1 home=H1 starter=S1
    "#,
    )
    .unwrap();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    assert_eq!(control.lock_all_points("NGP"), Ok(1));
    match control.set_point("NGP", "P102A", PointPosition::Reverse) {
        Err(CommandError::ResourceLocked(_)) => {}
        other => panic!("expected resource locked, got {:?}", other),
    }
}

#[test]
fn full_scenario_runs_a_train_through() {
    let (layout, names) = terminus();
    let timetable = input::timetable::parse_timetable(
        r#"
        train 12621 p=2 v=60.0 dir=up "Tamil Nadu Exp"
        wait 12
        depart 12621
        wait 1
    "#,
    )
    .unwrap();
    let control = run_scenario(&layout, &names, &timetable, 20, Box::new(NoDepartures));

    let arrived = control.log.records().iter().any(|r| {
        matches!(r.event, StationLogEvent::TrainArrived { train: 0, .. })
    });
    let departed = control.log.records().iter().any(|r| {
        matches!(r.event, StationLogEvent::TrainDeparted { train: 0, .. })
    });
    let exited = control
        .log
        .records()
        .iter()
        .any(|r| r.event == StationLogEvent::TrainExited(0));
    assert!(arrived && departed && exited);
    // The slot stays cleared after the exit.
    assert!(control.trains[0].is_none());
    // Its platform is free again.
    assert!(control.registry.platforms.iter().all(|p| p.occupant.is_none()));
}

#[test]
fn seeded_runs_are_reproducible() {
    let (layout, names) = terminus();
    let timetable = input::timetable::parse_timetable(
        r#"
        train 12859 p=2 v=60.0 dir=up "Gitanjali Express"
        train 12289 p=1 v=90.0 dir=up "CSMT NGP Duronto"
        wait 25
    "#,
    )
    .unwrap();

    let run1 = run_scenario(&layout, &names, &timetable, 15, Box::new(SeededDepartures::new(7, 0.3)));
    let run2 = run_scenario(&layout, &names, &timetable, 15, Box::new(SeededDepartures::new(7, 0.3)));
    assert_eq!(run1.log.records(), run2.log.records());
}

#[test]
fn select_station_scopes_snapshots() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    assert!(control.selected_snapshot().is_err());
    control.select_station("NGP").unwrap();
    let snap = control.selected_snapshot().unwrap();
    assert_eq!(snap.station, 0);
    assert_eq!(snap.signals.len(), 6);
    assert_eq!(snap.platforms.len(), 3);
    match control.select_station("BSL") {
        Err(CommandError::UnknownEntity(_)) => {}
        other => panic!("expected unknown station, got {:?}", other),
    }
}

#[test]
fn history_returns_most_recent_first() {
    let (layout, names) = terminus();
    let mut control = TrainControl::new(&layout, &names, Box::new(NoDepartures));
    control.enter_train(&express("12619", 2));
    for _ in 0..6 {
        control.tick();
    }
    let recent = control.history(3);
    assert!(recent.len() <= 3);
    for pair in recent.windows(2) {
        assert!(pair[0].tick >= pair[1].tick);
    }
}

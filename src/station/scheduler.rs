use log::debug;

use crate::input::layout::*;
use crate::output::history::{Actor, Category, EventLog, StationLogEvent, Tick};
use crate::station::interlocking;
use crate::station::movement::{next_station, Train, TrainId, TrainPosition, TrainStatus};
use crate::station::registry::{Change, Registry};
use crate::station::Rejection;

/// Pick the next (train, platform) pair for a station, or nothing if no
/// train is waiting or no usable platform is free. A pure function of the
/// snapshot: candidates are ordered by priority, then entry tick, then
/// train id, so re-running on identical state always gives the same answer.
/// The platform is the lowest-numbered free one whose route the validator
/// could actually establish; platforms promised to other trains are not
/// free. A later, higher-priority arrival therefore takes a platform ahead
/// of a longer-waiting, lower-priority train.
pub fn assign_platform(
    reg: &Registry,
    trains: &[Option<Train>],
    station: StationId,
) -> Option<(TrainId, PlatformId)> {
    let mut candidates: Vec<(u8, Tick, TrainId)> = trains
        .iter()
        .enumerate()
        .filter_map(|(id, slot)| slot.as_ref().map(|t| (id, t)))
        .filter(|(_, t)| t.assignment.is_none())
        .filter(|(_, t)| t.status == TrainStatus::Running || t.status == TrainStatus::Approaching)
        .filter(|(_, t)| match t.position {
            TrainPosition::OnLine { km } => {
                next_station(reg.layout, km, t.desc.direction) == Some(station)
            }
            _ => false,
        })
        .map(|(id, t)| (t.desc.priority, t.entered, id))
        .collect();
    candidates.sort();
    let &(_, _, train) = candidates.first()?;

    let promised: Vec<PlatformId> = trains
        .iter()
        .filter_map(|slot| slot.as_ref().and_then(|t| t.assignment))
        .collect();

    let platform = reg
        .free_platforms(station)
        .into_iter()
        .filter(|p| !promised.contains(p))
        .find(|&p| establishable(reg, p))?;

    debug!("station {}: platform {} to train {}", station, platform, train);
    Some((train, platform))
}

/// Could the platform's route be set up right now? Points must be in
/// position already or free to move, and the home signal must not be in
/// conflict with a mutually exclusive peer.
fn establishable(reg: &Registry, platform: PlatformId) -> bool {
    match reg.layout.route_for(platform) {
        Some(route) => {
            route.points.iter().all(|&(p, pos)| {
                reg.points[p].position == pos || interlocking::can_set_point(reg, p, pos).is_ok()
            }) && interlocking::exclusive_conflict(reg, route.home).is_none()
        }
        None => false,
    }
}

/// Set the route for a granted assignment: move the points, then clear the
/// home signal. Everything is validated before the first mutation, so a
/// refusal leaves the registry untouched.
pub fn establish_route(
    reg: &mut Registry,
    log: &mut EventLog,
    tick: Tick,
    platform: PlatformId,
) -> Result<(), Rejection> {
    let layout = reg.layout;
    let route = match layout.route_for(platform) {
        Some(r) => r,
        None => return Err(Rejection::NoRoute(platform)),
    };

    for &(p, pos) in route.points.iter() {
        if reg.points[p].position != pos {
            interlocking::can_set_point(reg, p, pos)?;
        }
    }
    if let Some(other) = interlocking::exclusive_conflict(reg, route.home) {
        return Err(Rejection::ConflictingSignal { signal: route.home, other: other });
    }
    if reg.platforms[route.platform].occupied() {
        return Err(Rejection::PlatformOccupied {
            signal: route.home,
            platform: route.platform,
        });
    }

    for &(p, pos) in route.points.iter() {
        if let Ok(Change::Updated) = reg.apply_point_change(p, pos) {
            log.append(tick, Actor::System, Category::Info, StationLogEvent::PointMoved(p, pos));
        }
    }
    interlocking::can_set_signal(reg, route.home, SignalAspect::Green)?;
    reg.apply_signal_change(route.home, SignalAspect::Green);
    log.append(
        tick,
        Actor::System,
        Category::Success,
        StationLogEvent::SignalAspect(route.home, SignalAspect::Green),
    );
    Ok(())
}

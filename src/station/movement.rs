use ordered_float::OrderedFloat;

use crate::input::layout::*;
use crate::output::history::{Actor, Category, EventLog, StationLogEvent, Tick};
use crate::station::interlocking;
use crate::station::random::RandomSource;
use crate::station::registry::{Change, Registry};

pub type TrainId = usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrainStatus {
    Running,
    Approaching,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainPosition {
    OnLine { km: f64 },
    AtPlatform { station: StationId, platform: PlatformId },
}

#[derive(Debug, Clone)]
pub struct TrainDesc {
    pub number: String,
    pub name: String,
    pub priority: u8,
    pub max_speed: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct Train {
    pub desc: TrainDesc,
    pub status: TrainStatus,
    pub position: TrainPosition,
    pub speed: f64,
    pub entered: Tick,
    pub assignment: Option<PlatformId>,
    pub blocked: Option<BlockReason>,
    pub departure_pending: bool,
}

/// Remembered between ticks so a continuously blocked train logs its block
/// once per episode instead of once per tick. Moving again clears the memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    SignalAtDanger(SignalId),
    PointMismatch(PointId),
    PlatformOccupied(PlatformId),
    NoPlatform,
}

pub enum MoveOutcome {
    Stayed,
    Arrived(StationId),
    Departed(StationId),
    Exited,
}

/// One tick of simulated time, in minutes.
pub const MINUTES_PER_TICK: f64 = 1.0;
/// A train closer than this to its next station reports as approaching.
pub const APPROACH_KM: f64 = 3.0;
/// Holding position short of a station when entry is not yet permitted.
pub const HOLD_KM: f64 = 0.2;
/// Trains this far past the end stations leave the model.
pub const BOUNDARY_KM: f64 = 5.0;

pub fn next_station(layout: &StationLayout, km: f64, dir: Direction) -> Option<StationId> {
    match dir {
        Direction::Up => layout
            .stations
            .iter()
            .enumerate()
            .filter(|(_, s)| s.km > km + 1e-9)
            .min_by_key(|&(_, s)| OrderedFloat(s.km))
            .map(|(i, _)| i),
        Direction::Down => layout
            .stations
            .iter()
            .enumerate()
            .filter(|(_, s)| s.km < km - 1e-9)
            .max_by_key(|&(_, s)| OrderedFloat(s.km))
            .map(|(i, _)| i),
    }
}

fn step_km(km: f64, dx: f64, dir: Direction) -> f64 {
    match dir {
        Direction::Up => km + dx,
        Direction::Down => km - dx,
    }
}

fn hold_point(station_km: f64, dir: Direction) -> f64 {
    match dir {
        Direction::Up => station_km - HOLD_KM,
        Direction::Down => station_km + HOLD_KM,
    }
}

/// Advance one train by one tick. Entry to a platform is permitted only when
/// the scheduler has assigned one and its route is fully established; in any
/// other case the train is held in place with speed zero. "Can't move yet"
/// is a normal condition here, never an error.
pub fn advance_train(
    id: TrainId,
    train: &mut Train,
    reg: &mut Registry,
    rng: &mut dyn RandomSource,
    log: &mut EventLog,
    tick: Tick,
) -> MoveOutcome {
    match train.position.clone() {
        TrainPosition::AtPlatform { station, platform } => {
            if !train.departure_pending && !rng.departure_ready() {
                return MoveOutcome::Stayed;
            }
            // Departure intent persists until the road is actually clear.
            train.departure_pending = true;

            let layout = reg.layout;
            if let Some(route) = layout.route_for(platform) {
                if reg.signals[route.starter].aspect != SignalAspect::Green {
                    // Ask for the road on the train's behalf.
                    if interlocking::can_set_signal(reg, route.starter, SignalAspect::Green).is_ok() {
                        reg.apply_signal_change(route.starter, SignalAspect::Green);
                        log.append(
                            tick,
                            Actor::System,
                            Category::Info,
                            StationLogEvent::SignalAspect(route.starter, SignalAspect::Green),
                        );
                    }
                    return MoveOutcome::Stayed;
                }
                // Pulling out puts the starter back to danger.
                reg.release_platform(platform);
                reg.apply_signal_change(route.starter, SignalAspect::Red);
                log.append(
                    tick,
                    Actor::System,
                    Category::Info,
                    StationLogEvent::SignalAspect(route.starter, SignalAspect::Red),
                );
            } else {
                reg.release_platform(platform);
            }

            train.position = TrainPosition::OnLine { km: reg.layout.stations[station].km };
            train.status = TrainStatus::Running;
            train.speed = train.desc.max_speed;
            train.departure_pending = false;
            train.blocked = None;
            log.append(
                tick,
                Actor::System,
                Category::Success,
                StationLogEvent::TrainDeparted { train: id, platform: platform },
            );
            MoveOutcome::Departed(station)
        }

        TrainPosition::OnLine { km } => {
            let layout = reg.layout;
            let dir = train.desc.direction;
            let dx = train.desc.max_speed * MINUTES_PER_TICK / 60.0;

            let target = match next_station(layout, km, dir) {
                Some(st) => st,
                None => {
                    // Past the last station: run out to the model boundary.
                    let km2 = step_km(km, dx, dir);
                    let (lo, hi) = layout.boundaries();
                    if km2 < lo - BOUNDARY_KM || km2 > hi + BOUNDARY_KM {
                        log.append(tick, Actor::System, Category::Info, StationLogEvent::TrainExited(id));
                        return MoveOutcome::Exited;
                    }
                    train.position = TrainPosition::OnLine { km: km2 };
                    train.status = TrainStatus::Running;
                    train.speed = train.desc.max_speed;
                    return MoveOutcome::Stayed;
                }
            };

            let station_km = layout.stations[target].km;
            let dist = (station_km - km).abs();
            if dist <= APPROACH_KM {
                train.status = TrainStatus::Approaching;
            }

            let to_threshold = (dist - HOLD_KM).max(0.0);
            if dx < to_threshold {
                train.position = TrainPosition::OnLine { km: step_km(km, dx, dir) };
                train.speed = train.desc.max_speed;
                train.blocked = None;
                return MoveOutcome::Stayed;
            }

            // At the arrival threshold.
            let mut block = BlockReason::NoPlatform;
            if let Some(platform) = train.assignment {
                if let Some(route) = layout.route_for(platform) {
                    if interlocking::route_ready(reg, route) {
                        reg.occupy_platform(platform, id);
                        // The train passing the home signal puts it back to danger.
                        if reg.apply_signal_change(route.home, SignalAspect::Red) == Change::Updated {
                            log.append(
                                tick,
                                Actor::System,
                                Category::Info,
                                StationLogEvent::SignalAspect(route.home, SignalAspect::Red),
                            );
                        }
                        train.position = TrainPosition::AtPlatform { station: target, platform: platform };
                        train.status = TrainStatus::Stopped;
                        train.speed = 0.0;
                        train.assignment = None;
                        train.blocked = None;
                        log.append(
                            tick,
                            Actor::System,
                            Category::Success,
                            StationLogEvent::TrainArrived { train: id, platform: platform },
                        );
                        return MoveOutcome::Arrived(target);
                    }
                    block = if let Some(&(p, _)) = route
                        .points
                        .iter()
                        .find(|&&(p, pos)| reg.points[p].position != pos)
                    {
                        BlockReason::PointMismatch(p)
                    } else if reg.platforms[route.platform].occupied() {
                        BlockReason::PlatformOccupied(route.platform)
                    } else {
                        BlockReason::SignalAtDanger(route.home)
                    };
                }
            }

            // Hold short of the station; no silent teleports.
            train.position = TrainPosition::OnLine { km: hold_point(station_km, dir) };
            train.status = TrainStatus::Approaching;
            train.speed = 0.0;
            if train.blocked != Some(block) {
                let event = match block {
                    BlockReason::PointMismatch(p) => StationLogEvent::PointMismatch { train: id, point: p },
                    _ => StationLogEvent::SectionBlocked { train: id, station: target },
                };
                log.append(tick, Actor::System, Category::Info, event);
                train.blocked = Some(block);
            }
            MoveOutcome::Stayed
        }
    }
}

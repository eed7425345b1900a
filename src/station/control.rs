use ordered_float::OrderedFloat;

use crate::input::layout::*;
use crate::output::history::{Actor, Category, EventLog, EventRecord, StationLogEvent, Tick};
use crate::station::interlocking;
use crate::station::movement::{self, MoveOutcome, Train, TrainDesc, TrainId, TrainPosition, TrainStatus, BOUNDARY_KM};
use crate::station::random::RandomSource;
use crate::station::registry::{Change, PlatformState, PointState, Registry, SignalState};
use crate::station::scheduler;
use crate::station::{CommandError, Rejection};

/// Read-only state dump of one station, for a view layer to render.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub station: StationId,
    pub points: Vec<(PointId, PointState)>,
    pub signals: Vec<(SignalId, SignalState)>,
    pub platforms: Vec<(PlatformId, PlatformState)>,
    pub trains: Vec<(TrainId, Train)>,
}

/// The command and observation surface of one corridor. Owns the registry,
/// the trains and the event log; everything that happens to the model goes
/// through here, one synchronous tick at a time. Train slots are never
/// reused, so train ids stay unique for the lifetime of the control.
pub struct TrainControl<'a> {
    pub registry: Registry<'a>,
    pub names: &'a LayoutNames<String>,
    pub trains: Vec<Option<Train>>,
    pub log: EventLog,
    pub time: Tick,
    selected: Option<StationId>,
    rng: Box<dyn RandomSource>,
}

pub fn name_of<'b>(names: &'b NameMap<String>, n: usize) -> &'b str {
    for (k, v) in names.iter() {
        if *v == n {
            return k;
        }
    }
    panic!("unknown object {}", n);
}

impl<'a> TrainControl<'a> {
    pub fn new(
        layout: &'a StationLayout,
        names: &'a LayoutNames<String>,
        rng: Box<dyn RandomSource>,
    ) -> TrainControl<'a> {
        TrainControl {
            registry: Registry::new(layout),
            names: names,
            trains: Vec::new(),
            log: EventLog::new(),
            time: 0,
            selected: None,
            rng: rng,
        }
    }

    /// Advance the simulation one tick and return the events it produced.
    /// Scheduling runs first (stations in km order), then train movement in
    /// train id order; departures re-run the scheduler for their station.
    pub fn tick(&mut self) -> Vec<EventRecord> {
        self.time += 1;
        let mark = self.log.len();

        for st in self.station_order() {
            self.run_scheduler(st);
        }

        for id in 0..self.trains.len() {
            // Taken out of the slot while it moves, exactly so the movement
            // code can never observe a half-updated copy of itself.
            if let Some(mut train) = self.trains[id].take() {
                let outcome = movement::advance_train(
                    id,
                    &mut train,
                    &mut self.registry,
                    &mut *self.rng,
                    &mut self.log,
                    self.time,
                );
                match outcome {
                    MoveOutcome::Exited => {}
                    MoveOutcome::Departed(st) => {
                        self.trains[id] = Some(train);
                        self.run_scheduler(st);
                    }
                    _ => {
                        self.trains[id] = Some(train);
                    }
                }
            }
        }

        self.log.since(mark)
    }

    fn run_scheduler(&mut self, station: StationId) {
        while let Some((train, platform)) =
            scheduler::assign_platform(&self.registry, &self.trains, station)
        {
            if let Some(t) = self.trains[train].as_mut() {
                t.assignment = Some(platform);
            }
            self.log.append(
                self.time,
                Actor::System,
                Category::Success,
                StationLogEvent::PlatformAssigned { train: train, platform: platform },
            );
            if let Err(r) = scheduler::establish_route(&mut self.registry, &mut self.log, self.time, platform)
            {
                // The assignment precheck makes this unreachable in practice;
                // the train will hold at the approach boundary regardless.
                log::debug!("route to platform {} refused: {:?}", platform, r);
            }
        }
    }

    /// A train enters the modeled corridor at the boundary for its direction.
    pub fn enter_train(&mut self, desc: &TrainDesc) -> TrainId {
        let (lo, hi) = self.registry.layout.boundaries();
        let km = match desc.direction {
            movement::Direction::Up => lo - BOUNDARY_KM,
            movement::Direction::Down => hi + BOUNDARY_KM,
        };
        let id = self.trains.len();
        self.trains.push(Some(Train {
            desc: desc.clone(),
            status: TrainStatus::Running,
            position: TrainPosition::OnLine { km: km },
            speed: desc.max_speed,
            entered: self.time,
            assignment: None,
            blocked: None,
            departure_pending: false,
        }));
        self.log.append(self.time, Actor::System, Category::Info, StationLogEvent::TrainEntered(id));
        id
    }

    /// Externally triggered departure for a stopped train.
    pub fn request_departure(&mut self, number: &str) -> Result<(), CommandError> {
        match self.train_by_number(number) {
            Some(id) => {
                if let Some(t) = self.trains[id].as_mut() {
                    t.departure_pending = true;
                }
                Ok(())
            }
            None => {
                let err = CommandError::UnknownEntity(format!("train {}", number));
                self.reject(&format!("depart {}", number), &err);
                Err(err)
            }
        }
    }

    pub fn set_point(
        &mut self,
        station: &str,
        point: &str,
        position: PointPosition,
    ) -> Result<Change, CommandError> {
        match self.try_set_point(station, point, position) {
            Ok(change) => Ok(change),
            Err(err) => {
                self.reject(&format!("point {} -> {:?}", point, position), &err);
                Err(err)
            }
        }
    }

    fn try_set_point(
        &mut self,
        station: &str,
        point: &str,
        position: PointPosition,
    ) -> Result<Change, CommandError> {
        let st = self.station_id(station)?;
        let id = self.point_id(point)?;
        if self.registry.layout.points[id].station != st {
            return Err(CommandError::UnknownEntity(format!("point {} at {}", point, station)));
        }
        interlocking::can_set_point(&self.registry, id, position)
            .map_err(|r| self.describe(r))?;
        let change = self
            .registry
            .apply_point_change(id, position)
            .map_err(|r| self.describe(r))?;
        if change == Change::Updated {
            self.log.append(
                self.time,
                Actor::Operator,
                Category::Manual,
                StationLogEvent::PointMoved(id, position),
            );
        }
        Ok(change)
    }

    pub fn set_signal(
        &mut self,
        station: &str,
        signal: &str,
        aspect: SignalAspect,
    ) -> Result<Change, CommandError> {
        match self.try_set_signal(station, signal, aspect) {
            Ok(change) => Ok(change),
            Err(err) => {
                self.reject(&format!("signal {} -> {:?}", signal, aspect), &err);
                Err(err)
            }
        }
    }

    fn try_set_signal(
        &mut self,
        station: &str,
        signal: &str,
        aspect: SignalAspect,
    ) -> Result<Change, CommandError> {
        let st = self.station_id(station)?;
        let id = self.signal_id(signal)?;
        if self.registry.layout.signals[id].station != st {
            return Err(CommandError::UnknownEntity(format!("signal {} at {}", signal, station)));
        }
        interlocking::can_set_signal(&self.registry, id, aspect)
            .map_err(|r| self.describe(r))?;
        let change = self.registry.apply_signal_change(id, aspect);
        if change == Change::Updated {
            self.log.append(
                self.time,
                Actor::Operator,
                Category::Manual,
                StationLogEvent::SignalAspect(id, aspect),
            );
        }
        Ok(change)
    }

    /// Drop every signal of a station to red. Always legal: red is the safe
    /// aspect, so this path skips the validator on purpose.
    pub fn emergency_stop(&mut self, station: &str) -> Result<usize, CommandError> {
        let st = self.station_id(station)?;
        self.log.append(
            self.time,
            Actor::Operator,
            Category::Emergency,
            StationLogEvent::EmergencyStop(st),
        );
        let mut changed = 0;
        for id in 0..self.registry.signals.len() {
            if self.registry.layout.signals[id].station == st {
                if self.registry.apply_signal_change(id, SignalAspect::Red) == Change::Updated {
                    self.log.append(
                        self.time,
                        Actor::Operator,
                        Category::Emergency,
                        StationLogEvent::SignalAspect(id, SignalAspect::Red),
                    );
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    /// Lock every point of a station in its current position.
    pub fn lock_all_points(&mut self, station: &str) -> Result<usize, CommandError> {
        let st = self.station_id(station)?;
        let mut changed = 0;
        for id in 0..self.registry.points.len() {
            if self.registry.layout.points[id].station == st {
                if self.registry.lock_point(id) == Change::Updated {
                    self.log.append(
                        self.time,
                        Actor::Operator,
                        Category::Emergency,
                        StationLogEvent::PointLocked(id),
                    );
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    pub fn select_station(&mut self, code: &str) -> Result<StationId, CommandError> {
        let st = self.station_id(code)?;
        self.selected = Some(st);
        Ok(st)
    }

    pub fn selected_snapshot(&self) -> Result<Snapshot, CommandError> {
        match self.selected {
            Some(st) => Ok(self.snapshot_of(st)),
            None => Err(CommandError::UnknownEntity("no station selected".to_string())),
        }
    }

    pub fn snapshot(&self, code: &str) -> Result<Snapshot, CommandError> {
        Ok(self.snapshot_of(self.station_id(code)?))
    }

    fn snapshot_of(&self, st: StationId) -> Snapshot {
        let layout = self.registry.layout;
        let points = layout
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.station == st)
            .map(|(id, _)| (id, self.registry.points[id]))
            .collect();
        let signals = layout
            .signals
            .iter()
            .enumerate()
            .filter(|(_, s)| s.station == st)
            .map(|(id, _)| (id, self.registry.signals[id]))
            .collect();
        let platforms = layout
            .station_platforms(st)
            .map(|id| (id, self.registry.platforms[id]))
            .collect();
        let mut trains: Vec<(TrainId, Train)> = self
            .trains
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|t| (id, t.clone())))
            .filter(|(_, t)| match &t.position {
                TrainPosition::AtPlatform { station, .. } => *station == st,
                TrainPosition::OnLine { km } => {
                    movement::next_station(layout, *km, t.desc.direction) == Some(st)
                }
            })
            .collect();
        trains.sort_by_key(|&(id, ref t)| {
            let dist = match &t.position {
                TrainPosition::AtPlatform { .. } => 0.0,
                TrainPosition::OnLine { km } => (layout.stations[st].km - km).abs(),
            };
            (OrderedFloat(dist), id)
        });
        Snapshot {
            station: st,
            points: points,
            signals: signals,
            platforms: platforms,
            trains: trains,
        }
    }

    /// The last `n` events, most recent first.
    pub fn history(&self, n: usize) -> Vec<&EventRecord> {
        self.log.recent(n)
    }

    pub fn train_by_number(&self, number: &str) -> Option<TrainId> {
        self.trains
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.as_ref().map(|t| t.desc.number == number).unwrap_or(false))
            .map(|(id, _)| id)
    }

    fn station_order(&self) -> Vec<StationId> {
        let mut ids: Vec<StationId> = (0..self.registry.layout.stations.len()).collect();
        ids.sort_by_key(|&i| OrderedFloat(self.registry.layout.stations[i].km));
        ids
    }

    fn station_id(&self, code: &str) -> Result<StationId, CommandError> {
        self.names
            .station_names
            .get(code)
            .cloned()
            .ok_or_else(|| CommandError::UnknownEntity(format!("station {}", code)))
    }

    fn point_id(&self, name: &str) -> Result<PointId, CommandError> {
        self.names
            .point_names
            .get(name)
            .cloned()
            .ok_or_else(|| CommandError::UnknownEntity(format!("point {}", name)))
    }

    fn signal_id(&self, name: &str) -> Result<SignalId, CommandError> {
        self.names
            .signal_names
            .get(name)
            .cloned()
            .ok_or_else(|| CommandError::UnknownEntity(format!("signal {}", name)))
    }

    fn reject(&mut self, command: &str, err: &CommandError) {
        self.log.append(
            self.time,
            Actor::Operator,
            Category::Manual,
            StationLogEvent::CommandRejected(format!("{}: {}", command, err)),
        );
    }

    fn describe(&self, rejection: Rejection) -> CommandError {
        let points = &self.names.point_names;
        let signals = &self.names.signal_names;
        match rejection {
            Rejection::PointLocked(p) => {
                CommandError::ResourceLocked(format!("point {}", name_of(points, p)))
            }
            Rejection::PointUnavailable(p) => {
                CommandError::ResourceUnavailable(format!("point {}", name_of(points, p)))
            }
            Rejection::PointMisaligned { signal, point } => CommandError::InterlockViolation(format!(
                "signal {} requires point {} in position",
                name_of(signals, signal),
                name_of(points, point)
            )),
            Rejection::PlatformOccupied { signal, platform } => {
                CommandError::InterlockViolation(format!(
                    "signal {} protects occupied platform {}",
                    name_of(signals, signal),
                    self.registry.layout.platforms[platform].number
                ))
            }
            Rejection::ConflictingSignal { signal, other } => CommandError::InterlockViolation(format!(
                "signal {} conflicts with cleared signal {}",
                name_of(signals, signal),
                name_of(signals, other)
            )),
            Rejection::PointHeldByRoute { point, signal }
            | Rejection::PointHeldByConstraint { point, signal } => {
                CommandError::InterlockViolation(format!(
                    "point {} is held while signal {} is cleared",
                    name_of(points, point),
                    name_of(signals, signal)
                ))
            }
            Rejection::NoRoute(platform) => CommandError::InterlockViolation(format!(
                "platform {} has no route",
                self.registry.layout.platforms[platform].number
            )),
        }
    }
}

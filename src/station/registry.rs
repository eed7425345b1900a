use crate::input::layout::*;
use crate::station::movement::TrainId;
use crate::station::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointState {
    pub position: PointPosition,
    pub status: PointStatus,
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalState {
    pub aspect: SignalAspect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformState {
    pub occupant: Option<TrainId>,
}

impl PlatformState {
    pub fn occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Whether an apply call actually mutated anything, so callers can keep
/// repeated commands from producing duplicate change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Updated,
    Unchanged,
}

/// Runtime state of one corridor's resources. Mechanism only: the registry
/// guards a point's own lock and maintenance flags, but all cross-resource
/// legality (routes, constraints) is the interlocking module's decision.
#[derive(Debug)]
pub struct Registry<'a> {
    pub layout: &'a StationLayout,
    pub points: Vec<PointState>,
    pub signals: Vec<SignalState>,
    pub platforms: Vec<PlatformState>,
}

impl<'a> Registry<'a> {
    pub fn new(layout: &'a StationLayout) -> Registry<'a> {
        Registry {
            layout: layout,
            points: layout
                .points
                .iter()
                .map(|p| PointState {
                    position: p.position,
                    status: p.status,
                    locked: p.locked,
                })
                .collect(),
            signals: layout
                .signals
                .iter()
                .map(|s| SignalState { aspect: s.aspect })
                .collect(),
            platforms: layout
                .platforms
                .iter()
                .map(|_| PlatformState { occupant: None })
                .collect(),
        }
    }

    /// Unoccupied platforms of a station, lowest platform number first.
    pub fn free_platforms(&self, station: StationId) -> Vec<PlatformId> {
        let mut free: Vec<PlatformId> = self
            .layout
            .station_platforms(station)
            .filter(|&p| !self.platforms[p].occupied())
            .collect();
        free.sort_by_key(|&p| self.layout.platforms[p].number);
        free
    }

    pub fn apply_point_change(
        &mut self,
        point: PointId,
        position: PointPosition,
    ) -> Result<Change, Rejection> {
        let state = &mut self.points[point];
        if state.locked {
            return Err(Rejection::PointLocked(point));
        }
        if state.status != PointStatus::Working {
            return Err(Rejection::PointUnavailable(point));
        }
        if state.position == position {
            return Ok(Change::Unchanged);
        }
        state.position = position;
        Ok(Change::Updated)
    }

    pub fn apply_signal_change(&mut self, signal: SignalId, aspect: SignalAspect) -> Change {
        let state = &mut self.signals[signal];
        if state.aspect == aspect {
            return Change::Unchanged;
        }
        state.aspect = aspect;
        Change::Updated
    }

    pub fn lock_point(&mut self, point: PointId) -> Change {
        let state = &mut self.points[point];
        if state.locked {
            return Change::Unchanged;
        }
        state.locked = true;
        Change::Updated
    }

    pub fn occupy_platform(&mut self, platform: PlatformId, train: TrainId) {
        self.platforms[platform].occupant = Some(train);
    }

    pub fn release_platform(&mut self, platform: PlatformId) {
        self.platforms[platform].occupant = None;
    }
}

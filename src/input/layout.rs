use smallvec::SmallVec;

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub type StationId = usize;
pub type PointId = usize;
pub type SignalId = usize;
pub type PlatformId = usize;

pub type NameMap<Ref> = HashMap<Ref, usize>;

/// Static description of a corridor of stations: the part of the model
/// that never changes after loading. Runtime state (point positions,
/// signal aspects, platform occupancy) lives in the registry.
#[derive(Debug)]
pub struct StationLayout {
    pub stations: Vec<Station>,
    pub points: Vec<Point>,
    pub signals: Vec<Signal>,
    pub platforms: Vec<Platform>,
    pub routes: Vec<PlatformRoute>,
    pub interlocks: Vec<Interlock>,
}

#[derive(Debug)]
pub struct LayoutNames<Ref: Hash + Eq + Debug> {
    pub station_names: NameMap<Ref>,
    pub point_names: NameMap<Ref>,
    pub signal_names: NameMap<Ref>,
}

#[derive(Debug)]
pub struct Station {
    pub name: String,
    pub km: f64,
    pub platform_count: usize,
    pub track_lines: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointPosition {
    Normal,
    Reverse,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointStatus {
    Working,
    Maintenance,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignalKind {
    Home,
    Starter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignalAspect {
    Red,
    Yellow,
    Green,
}

/// Initial values are part of the layout; the registry copies them on
/// construction and owns them from then on.
#[derive(Debug)]
pub struct Point {
    pub station: StationId,
    pub position: PointPosition,
    pub status: PointStatus,
    pub locked: bool,
}

#[derive(Debug)]
pub struct Signal {
    pub station: StationId,
    pub kind: SignalKind,
    pub aspect: SignalAspect,
}

#[derive(Debug)]
pub struct Platform {
    pub station: StationId,
    pub number: usize,
}

/// The interlocking unit: a platform together with its entry (home) signal,
/// exit (starter) signal, and the point positions the route requires.
#[derive(Debug, Clone)]
pub struct PlatformRoute {
    pub platform: PlatformId,
    pub home: SignalId,
    pub starter: SignalId,
    pub points: SmallVec<[(PointId, PointPosition); 2]>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InterlockCondition {
    MutuallyExclusive,
    Dependent,
}

#[derive(Debug, Clone)]
pub struct Interlock {
    pub condition: InterlockCondition,
    pub points: SmallVec<[PointId; 2]>,
    pub signals: SmallVec<[SignalId; 2]>,
}

impl StationLayout {
    pub fn station_platforms<'a>(&'a self, station: StationId) -> impl Iterator<Item = PlatformId> + 'a {
        self.platforms
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.station == station)
            .map(|(id, _)| id)
    }

    pub fn route_for(&self, platform: PlatformId) -> Option<&PlatformRoute> {
        self.routes.iter().find(|r| r.platform == platform)
    }

    pub fn route_of_signal(&self, signal: SignalId) -> Option<&PlatformRoute> {
        self.routes
            .iter()
            .find(|r| r.home == signal || r.starter == signal)
    }

    /// Km positions of the first and last station on the corridor.
    pub fn boundaries(&self) -> (f64, f64) {
        let mut lo = std::f64::INFINITY;
        let mut hi = std::f64::NEG_INFINITY;
        for s in &self.stations {
            if s.km < lo {
                lo = s.km;
            }
            if s.km > hi {
                hi = s.km;
            }
        }
        (lo, hi)
    }
}

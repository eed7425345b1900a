use crate::input::layout::{PlatformId, PointId, PointPosition, SignalAspect, SignalId, StationId};
use crate::station::movement::TrainId;

pub type Tick = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    System,
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Info,
    Success,
    Emergency,
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StationLogEvent {
    TrainEntered(TrainId),
    TrainArrived { train: TrainId, platform: PlatformId },
    TrainDeparted { train: TrainId, platform: PlatformId },
    TrainExited(TrainId),
    PlatformAssigned { train: TrainId, platform: PlatformId },
    PointMoved(PointId, PointPosition),
    PointLocked(PointId),
    SignalAspect(SignalId, SignalAspect),
    SectionBlocked { train: TrainId, station: StationId },
    PointMismatch { train: TrainId, point: PointId },
    EmergencyStop(StationId),
    CommandRejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub tick: Tick,
    pub actor: Actor,
    pub category: Category,
    pub event: StationLogEvent,
}

/// Append-only record of everything that happened. The model writes here and
/// never reads back; retention limits are for viewers to apply via `recent`.
#[derive(Debug, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> EventLog {
        Default::default()
    }

    pub fn append(&mut self, tick: Tick, actor: Actor, category: Category, event: StationLogEvent) {
        self.records.push(EventRecord {
            tick: tick,
            actor: actor,
            category: category,
            event: event,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// The last `n` records, most recent first.
    pub fn recent(&self, n: usize) -> Vec<&EventRecord> {
        self.records.iter().rev().take(n).collect()
    }

    /// Everything appended since a previously observed length.
    pub fn since(&self, mark: usize) -> Vec<EventRecord> {
        self.records[mark..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_is_most_recent_first() {
        let mut log = EventLog::new();
        for i in 0..5 {
            log.append(i, Actor::System, Category::Info, StationLogEvent::TrainEntered(i as usize));
        }
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].tick, 4);
        assert_eq!(recent[1].tick, 3);
        assert_eq!(log.recent(100).len(), 5);
    }
}

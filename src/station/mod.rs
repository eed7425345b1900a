//! Station resource model: registry, interlocking, movement, scheduling.

pub mod control;
pub mod interlocking;
pub mod movement;
pub mod random;
pub mod registry;
pub mod scheduler;

use crate::input::layout::{PlatformId, PointId, SignalId};
use failure_derive::Fail;

/// Why the validator (or the registry's own guards) refused a state change.
/// Internal form with dense ids; the control layer renders these against the
/// name maps before handing them to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    PointLocked(PointId),
    PointUnavailable(PointId),
    PointMisaligned { signal: SignalId, point: PointId },
    PlatformOccupied { signal: SignalId, platform: PlatformId },
    ConflictingSignal { signal: SignalId, other: SignalId },
    PointHeldByRoute { point: PointId, signal: SignalId },
    PointHeldByConstraint { point: PointId, signal: SignalId },
    NoRoute(PlatformId),
}

/// Operator-facing command outcome. All variants are expected, recoverable
/// conditions; nothing here aborts the simulation.
#[derive(Debug, Fail, PartialEq)]
pub enum CommandError {
    #[fail(display = "unknown entity: {}", _0)]
    UnknownEntity(String),
    #[fail(display = "{} is locked", _0)]
    ResourceLocked(String),
    #[fail(display = "{} is under maintenance", _0)]
    ResourceUnavailable(String),
    #[fail(display = "interlock violation: {}", _0)]
    InterlockViolation(String),
}

//! Interlocking rules. Every function here is a pure predicate over the
//! current registry state; nothing in this module mutates anything.

use crate::input::layout::*;
use crate::station::registry::Registry;
use crate::station::Rejection;

/// A point may change position only when it is serviceable and no cleared
/// signal depends on it, either through a platform route or through a
/// dependent constraint.
pub fn can_set_point(reg: &Registry, point: PointId, position: PointPosition) -> Result<(), Rejection> {
    let state = &reg.points[point];
    if state.locked {
        return Err(Rejection::PointLocked(point));
    }
    if state.status != PointStatus::Working {
        return Err(Rejection::PointUnavailable(point));
    }
    if state.position == position {
        // No movement, nothing to interlock against.
        return Ok(());
    }

    // A point under a route whose signal is off red is mid-route.
    for route in reg.layout.routes.iter() {
        if route.points.iter().any(|&(p, _)| p == point) {
            for &sig in &[route.home, route.starter] {
                if reg.signals[sig].aspect != SignalAspect::Red {
                    return Err(Rejection::PointHeldByRoute { point: point, signal: sig });
                }
            }
        }
    }

    for ilk in reg.layout.interlocks.iter() {
        if ilk.condition == InterlockCondition::Dependent && ilk.points.contains(&point) {
            if let Some(&sig) = ilk
                .signals
                .iter()
                .find(|&&s| reg.signals[s].aspect != SignalAspect::Red)
            {
                return Err(Rejection::PointHeldByConstraint { point: point, signal: sig });
            }
        }
    }

    Ok(())
}

/// Red is always permitted. A proceed aspect requires the signal's route
/// points to be in position and no mutually exclusive peer to be cleared;
/// green on a home signal additionally requires the destination platform
/// to be unoccupied.
pub fn can_set_signal(reg: &Registry, signal: SignalId, aspect: SignalAspect) -> Result<(), Rejection> {
    if aspect == SignalAspect::Red {
        return Ok(());
    }

    if let Some(other) = exclusive_conflict(reg, signal) {
        return Err(Rejection::ConflictingSignal { signal: signal, other: other });
    }

    if let Some(route) = reg.layout.route_of_signal(signal) {
        for &(p, required) in route.points.iter() {
            if reg.points[p].position != required {
                return Err(Rejection::PointMisaligned { signal: signal, point: p });
            }
        }
        if signal == route.home
            && aspect == SignalAspect::Green
            && reg.platforms[route.platform].occupied()
        {
            return Err(Rejection::PlatformOccupied {
                signal: signal,
                platform: route.platform,
            });
        }
    }

    Ok(())
}

/// The other signal of a mutually exclusive constraint that is currently
/// showing a proceed aspect, if any.
pub fn exclusive_conflict(reg: &Registry, signal: SignalId) -> Option<SignalId> {
    for ilk in reg.layout.interlocks.iter() {
        if ilk.condition == InterlockCondition::MutuallyExclusive && ilk.signals.contains(&signal) {
            if let Some(&other) = ilk
                .signals
                .iter()
                .find(|&&s| s != signal && reg.signals[s].aspect != SignalAspect::Red)
            {
                return Some(other);
            }
        }
    }
    None
}

/// The movement gate: a train may enter a platform only when every route
/// point is in position, the home signal shows green, and the platform is
/// empty.
pub fn route_ready(reg: &Registry, route: &PlatformRoute) -> bool {
    route
        .points
        .iter()
        .all(|&(p, pos)| reg.points[p].position == pos)
        && reg.signals[route.home].aspect == SignalAspect::Green
        && !reg.platforms[route.platform].occupied()
}

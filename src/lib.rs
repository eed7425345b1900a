//! SignalSense -- station resource model with interlocking and
//! priority-based platform assignment.
//!
//! The model is driven in discrete ticks: the scheduler hands free platforms
//! to waiting trains by priority, the interlocking validates every point and
//! signal change, and the movement code walks each train through approach,
//! platform and departure. Everything observable lands in an append-only
//! event log.

pub mod input;
pub mod output;
pub mod station;

#[cfg(test)]
mod tests;

use std::path::Path;

pub type AppResult<T> = Result<T, failure::Error>;

pub fn read_file(f: &Path) -> AppResult<String> {
    use std::fs::File;
    use std::io::prelude::*;
    use std::io::BufReader;

    let file = File::open(f)?;
    let mut file = BufReader::new(&file);
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

use crate::input::layout::{LayoutNames, StationLayout};
use crate::input::timetable::{Timetable, TimetableAction};
use crate::station::control::TrainControl;
use crate::station::random::RandomSource;

pub fn get_layout(p: &Path) -> AppResult<(StationLayout, LayoutNames<String>)> {
    let contents = read_file(p)?;
    get_layout_string(&contents)
}

pub fn get_layout_string(s: &str) -> AppResult<(StationLayout, LayoutNames<String>)> {
    let model = input::layout_parser::parse_layout(s)?;
    Ok(model)
}

pub fn get_timetable(p: &Path) -> AppResult<Timetable> {
    let contents = read_file(p)?;
    let t = input::timetable::parse_timetable(&contents)?;
    Ok(t)
}

/// Walk a timetable against a fresh control: waits advance the clock, train
/// entries and operator commands go through the command surface, and then
/// the model runs for `extra_ticks` more. Rejected commands are logged and
/// never abort the run.
pub fn run_scenario<'a>(
    layout: &'a StationLayout,
    names: &'a LayoutNames<String>,
    timetable: &Timetable,
    extra_ticks: u64,
    rng: Box<dyn RandomSource>,
) -> TrainControl<'a> {
    let mut control = TrainControl::new(layout, names, rng);
    for action in &timetable.actions {
        match action {
            TimetableAction::Wait(n) => {
                for _ in 0..*n {
                    control.tick();
                }
            }
            TimetableAction::Train(desc) => {
                control.enter_train(desc);
            }
            TimetableAction::Point { station, point, position } => {
                let _ = control.set_point(station, point, *position);
            }
            TimetableAction::Signal { station, signal, aspect } => {
                let _ = control.set_signal(station, signal, *aspect);
            }
            TimetableAction::Depart(number) => {
                let _ = control.request_departure(number);
            }
        }
    }
    for _ in 0..extra_ticks {
        control.tick();
    }
    control
}

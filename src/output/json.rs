use failure::Error;

use crate::input::layout::{PointPosition, PointStatus, SignalAspect};
use crate::output::history::{Actor, Category};
use crate::station::control::{name_of, Snapshot, TrainControl};
use crate::station::movement::{TrainPosition, TrainStatus};

use std::io;

fn json_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn aspect_str(a: SignalAspect) -> &'static str {
    match a {
        SignalAspect::Red => "red",
        SignalAspect::Yellow => "yellow",
        SignalAspect::Green => "green",
    }
}

fn position_str(p: PointPosition) -> &'static str {
    match p {
        PointPosition::Normal => "normal",
        PointPosition::Reverse => "reverse",
    }
}

pub fn json_snapshot<W: io::Write>(
    control: &TrainControl,
    snapshot: &Snapshot,
    f: &mut W,
) -> Result<(), Error> {
    let station = &control.registry.layout.stations[snapshot.station];
    write!(
        f,
        "{{ \"station\": \"{}\", \"name\": \"{}\", \"km\": {},\n",
        name_of(&control.names.station_names, snapshot.station),
        json_string(&station.name),
        station.km
    )?;

    write!(f, "\"points\": {{")?;
    let mut first = true;
    for &(id, state) in &snapshot.points {
        if first {
            first = false;
        } else {
            write!(f, ", ")?;
        }
        write!(
            f,
            "\"{}\": {{ \"position\": \"{}\", \"status\": \"{}\", \"locked\": {} }}",
            name_of(&control.names.point_names, id),
            position_str(state.position),
            if state.status == PointStatus::Working { "working" } else { "maintenance" },
            state.locked
        )?;
    }
    write!(f, "}},\n")?;

    write!(f, "\"signals\": {{")?;
    let mut first = true;
    for &(id, state) in &snapshot.signals {
        if first {
            first = false;
        } else {
            write!(f, ", ")?;
        }
        write!(
            f,
            "\"{}\": {{ \"aspect\": \"{}\" }}",
            name_of(&control.names.signal_names, id),
            aspect_str(state.aspect)
        )?;
    }
    write!(f, "}},\n")?;

    write!(f, "\"platforms\": [")?;
    let mut first = true;
    for &(id, state) in &snapshot.platforms {
        if first {
            first = false;
        } else {
            write!(f, ", ")?;
        }
        write!(
            f,
            "{{ \"number\": {}, \"occupant\": {} }}",
            control.registry.layout.platforms[id].number,
            match state.occupant {
                Some(t) => format!("{}", t),
                None => "null".to_string(),
            }
        )?;
    }
    write!(f, "],\n")?;

    write!(f, "\"trains\": [")?;
    let mut first = true;
    for &(id, ref train) in &snapshot.trains {
        if first {
            first = false;
        } else {
            write!(f, ", ")?;
        }
        let position = match &train.position {
            TrainPosition::OnLine { km } => format!("{{ \"km\": {} }}", km),
            TrainPosition::AtPlatform { platform, .. } => format!(
                "{{ \"platform\": {} }}",
                control.registry.layout.platforms[*platform].number
            ),
        };
        write!(
            f,
            "{{ \"id\": {}, \"number\": \"{}\", \"name\": \"{}\", \"priority\": {}, \
             \"status\": \"{}\", \"speed\": {}, \"position\": {} }}",
            id,
            json_string(&train.desc.number),
            json_string(&train.desc.name),
            train.desc.priority,
            match train.status {
                TrainStatus::Running => "running",
                TrainStatus::Approaching => "approaching",
                TrainStatus::Stopped => "stopped",
            },
            train.speed,
            position
        )?;
    }
    write!(f, "] }}\n")?;
    Ok(())
}

pub fn json_history<W: io::Write>(control: &TrainControl, f: &mut W) -> Result<(), Error> {
    write!(f, "{{ \"events\": [")?;
    let mut first = true;
    for record in control.log.records() {
        if first {
            first = false;
        } else {
            write!(f, ", ")?;
        }
        write!(
            f,
            "\n{{ \"tick\": {}, \"actor\": \"{}\", \"category\": \"{}\", \"event\": \"{}\" }}",
            record.tick,
            match record.actor {
                Actor::System => "system",
                Actor::Operator => "operator",
            },
            match record.category {
                Category::Info => "info",
                Category::Success => "success",
                Category::Emergency => "emergency",
                Category::Manual => "manual",
            },
            json_string(&format!("{:?}", record.event))
        )?;
    }
    write!(f, " ] }}\n")?;
    Ok(())
}

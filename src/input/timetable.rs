use regex::Regex;

use crate::input::layout::{PointPosition, SignalAspect};
use crate::station::movement::{Direction, TrainDesc};
use failure_derive::Fail;

#[derive(Debug)]
pub struct Timetable {
    pub actions: Vec<TimetableAction>,
}

#[derive(Debug)]
pub enum TimetableAction {
    Wait(u64),
    Train(TrainDesc),
    Point { station: String, point: String, position: PointPosition },
    Signal { station: String, signal: String, aspect: SignalAspect },
    Depart(String),
}

#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "error converting number")]
    NumberError,
    #[fail(display = "unrecognized timetable action: {}", _0)]
    Unrecognized(String),
}

/// Parses the timetable format
///
/// * wait 3
/// * train 12289 p=1 v=60.0 dir=up "CSMT NGP Duronto"
/// * point NGP P102A reverse
/// * signal NGP S3 green
/// * depart 12621
///
pub fn parse_timetable(input: &str) -> Result<Timetable, ParseError> {
    let mut actions = Vec::new();
    let wait_re = Regex::new(r"^\s*wait\s+(\d+)\s*$")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let train_re = Regex::new(
        r#"(?x) ^ \s* train \s+ (?P<number>\w+) \s+
            p \s* = \s* (?P<prio>\d+) \s+
            v \s* = \s* (?P<vel>[\d\.]+) \s+
            dir \s* = \s* (?P<dir>up|down) \s+
            "(?P<name>[^"]*)" \s* $"#,
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let point_re = Regex::new(r"(?x) ^ \s* point \s+ (?P<station>\w+) \s+ (?P<point>\w+) \s+ (?P<pos>normal|reverse) \s* $")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let signal_re = Regex::new(r"(?x) ^ \s* signal \s+ (?P<station>\w+) \s+ (?P<signal>\w+) \s+ (?P<aspect>red|yellow|green) \s* $")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let depart_re = Regex::new(r"^\s*depart\s+(\w+)\s*$")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let blank_re = Regex::new(r"^\s*(#.*)?$")
        .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;

    for line in input.lines() {
        if blank_re.is_match(line) {
            continue;
        }
        if let Some(groups) = wait_re.captures(line) {
            let ticks = groups[1].parse::<u64>().map_err(|_e| ParseError::NumberError)?;
            actions.push(TimetableAction::Wait(ticks));
            continue;
        }
        if let Some(groups) = train_re.captures(line) {
            actions.push(TimetableAction::Train(TrainDesc {
                number: groups["number"].to_string(),
                name: groups["name"].to_string(),
                priority: groups["prio"].parse::<u8>().map_err(|_e| ParseError::NumberError)?,
                max_speed: groups["vel"].parse::<f64>().map_err(|_e| ParseError::NumberError)?,
                direction: if &groups["dir"] == "up" { Direction::Up } else { Direction::Down },
            }));
            continue;
        }
        if let Some(groups) = point_re.captures(line) {
            actions.push(TimetableAction::Point {
                station: groups["station"].to_string(),
                point: groups["point"].to_string(),
                position: if &groups["pos"] == "reverse" {
                    PointPosition::Reverse
                } else {
                    PointPosition::Normal
                },
            });
            continue;
        }
        if let Some(groups) = signal_re.captures(line) {
            actions.push(TimetableAction::Signal {
                station: groups["station"].to_string(),
                signal: groups["signal"].to_string(),
                aspect: match &groups["aspect"] {
                    "green" => SignalAspect::Green,
                    "yellow" => SignalAspect::Yellow,
                    _ => SignalAspect::Red,
                },
            });
            continue;
        }
        if let Some(groups) = depart_re.captures(line) {
            actions.push(TimetableAction::Depart(groups[1].to_string()));
            continue;
        }
        return Err(ParseError::Unrecognized(line.to_string()));
    }

    Ok(Timetable { actions: actions })
}

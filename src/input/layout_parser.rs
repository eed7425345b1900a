use regex::Regex;

use crate::input::layout::*;
use failure_derive::Fail;

#[derive(Debug, Fail)]
pub enum ParseError {
    #[fail(display = "error in regular expression: {}", _0)]
    RegexError(String),
    #[fail(display = "error converting number")]
    NumberError,
    #[fail(display = "unknown name: {}", _0)]
    UnknownName(String),
    #[fail(display = "duplicate name: {}", _0)]
    DuplicateName(String),
    #[fail(display = "unrecognized layout statement: {}", _0)]
    Unrecognized(String),
}

fn lookup(names: &NameMap<String>, name: &str) -> Result<usize, ParseError> {
    names
        .get(name)
        .cloned()
        .ok_or_else(|| ParseError::UnknownName(name.to_string()))
}

fn insert_name(names: &mut NameMap<String>, name: &str, id: usize) -> Result<(), ParseError> {
    if names.insert(name.to_string(), id).is_some() {
        return Err(ParseError::DuplicateName(name.to_string()));
    }
    Ok(())
}

/// Parses the station layout format
///
/// * station NGP "Nagpur Jn" km=78.8 platforms=8 tracks=6
/// * point NGP P101A normal locked
/// * signal NGP H1 home yellow
/// * route NGP 1 home=H1 starter=S1 points=P101A:normal
/// * interlock exclusive points=P101A,P101B signals=H1
///
/// Statements must come in reference order: a station before its points and
/// signals, points and signals before the routes and interlocks naming them.
/// Platforms are created implicitly, numbered 1..=platforms.
pub fn parse_layout(input: &str) -> Result<(StationLayout, LayoutNames<String>), ParseError> {
    let station_re = Regex::new(
        r#"(?x) ^ \s* station \s+ (?P<code>\w+) \s+
            "(?P<name>[^"]*)" \s+
            km \s* = \s* (?P<km>[\d\.]+) \s+
            platforms \s* = \s* (?P<plat>\d+) \s+
            tracks \s* = \s* (?P<tracks>\d+) \s* $"#,
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let point_re = Regex::new(
        r"(?x) ^ \s* point \s+ (?P<station>\w+) \s+ (?P<name>\w+) \s+
            (?P<pos>normal|reverse)
            (?P<flags>(?:\s+(?:locked|maintenance))*) \s* $",
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let signal_re = Regex::new(
        r"(?x) ^ \s* signal \s+ (?P<station>\w+) \s+ (?P<name>\w+) \s+
            (?P<kind>home|starter) \s+ (?P<aspect>red|yellow|green) \s* $",
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let route_re = Regex::new(
        r"(?x) ^ \s* route \s+ (?P<station>\w+) \s+ (?P<platform>\d+) \s+
            home \s* = \s* (?P<home>\w+) \s+
            starter \s* = \s* (?P<starter>\w+)
            (?: \s+ points \s* = \s* (?P<points>[\w:,]+) )? \s* $",
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let interlock_re = Regex::new(
        r"(?x) ^ \s* interlock \s+ (?P<cond>exclusive|dependent) \s+
            points \s* = \s* (?P<points>[\w,]+) \s+
            signals \s* = \s* (?P<signals>[\w,]+) \s* $",
    )
    .map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;
    let blank_re =
        Regex::new(r"^\s*(#.*)?$").map_err(|e| ParseError::RegexError(format!("{:?}", e)))?;

    let mut layout = StationLayout {
        stations: Vec::new(),
        points: Vec::new(),
        signals: Vec::new(),
        platforms: Vec::new(),
        routes: Vec::new(),
        interlocks: Vec::new(),
    };
    let mut names = LayoutNames {
        station_names: NameMap::new(),
        point_names: NameMap::new(),
        signal_names: NameMap::new(),
    };

    for line in input.lines() {
        if blank_re.is_match(line) {
            continue;
        }
        if let Some(groups) = station_re.captures(line) {
            let id = layout.stations.len();
            insert_name(&mut names.station_names, &groups["code"], id)?;
            let platform_count = groups["plat"].parse::<usize>().map_err(|_e| ParseError::NumberError)?;
            layout.stations.push(Station {
                name: groups["name"].to_string(),
                km: groups["km"].parse::<f64>().map_err(|_e| ParseError::NumberError)?,
                platform_count: platform_count,
                track_lines: groups["tracks"].parse::<usize>().map_err(|_e| ParseError::NumberError)?,
            });
            for number in 1..=platform_count {
                layout.platforms.push(Platform { station: id, number: number });
            }
            continue;
        }
        if let Some(groups) = point_re.captures(line) {
            let station = lookup(&names.station_names, &groups["station"])?;
            let id = layout.points.len();
            insert_name(&mut names.point_names, &groups["name"], id)?;
            layout.points.push(Point {
                station: station,
                position: parse_position(&groups["pos"]),
                status: if groups["flags"].contains("maintenance") {
                    PointStatus::Maintenance
                } else {
                    PointStatus::Working
                },
                locked: groups["flags"].contains("locked"),
            });
            continue;
        }
        if let Some(groups) = signal_re.captures(line) {
            let station = lookup(&names.station_names, &groups["station"])?;
            let id = layout.signals.len();
            insert_name(&mut names.signal_names, &groups["name"], id)?;
            layout.signals.push(Signal {
                station: station,
                kind: match &groups["kind"] {
                    "home" => SignalKind::Home,
                    _ => SignalKind::Starter,
                },
                aspect: match &groups["aspect"] {
                    "green" => SignalAspect::Green,
                    "yellow" => SignalAspect::Yellow,
                    _ => SignalAspect::Red,
                },
            });
            continue;
        }
        if let Some(groups) = route_re.captures(line) {
            let station = lookup(&names.station_names, &groups["station"])?;
            let number = groups["platform"].parse::<usize>().map_err(|_e| ParseError::NumberError)?;
            let platform = layout
                .platforms
                .iter()
                .position(|p| p.station == station && p.number == number)
                .ok_or_else(|| {
                    ParseError::UnknownName(format!("{} platform {}", &groups["station"], number))
                })?;
            let mut points = smallvec::SmallVec::new();
            if let Some(list) = groups.name("points") {
                for item in list.as_str().split(',') {
                    let mut parts = item.splitn(2, ':');
                    let point = lookup(&names.point_names, parts.next().unwrap_or(""))?;
                    let pos = match parts.next() {
                        Some(p) if p == "normal" || p == "reverse" => parse_position(p),
                        _ => return Err(ParseError::Unrecognized(item.to_string())),
                    };
                    points.push((point, pos));
                }
            }
            layout.routes.push(PlatformRoute {
                platform: platform,
                home: lookup(&names.signal_names, &groups["home"])?,
                starter: lookup(&names.signal_names, &groups["starter"])?,
                points: points,
            });
            continue;
        }
        if let Some(groups) = interlock_re.captures(line) {
            let mut points = smallvec::SmallVec::new();
            for name in groups["points"].split(',') {
                points.push(lookup(&names.point_names, name)?);
            }
            let mut signals = smallvec::SmallVec::new();
            for name in groups["signals"].split(',') {
                signals.push(lookup(&names.signal_names, name)?);
            }
            layout.interlocks.push(Interlock {
                condition: match &groups["cond"] {
                    "exclusive" => InterlockCondition::MutuallyExclusive,
                    _ => InterlockCondition::Dependent,
                },
                points: points,
                signals: signals,
            });
            continue;
        }
        return Err(ParseError::Unrecognized(line.to_string()));
    }

    Ok((layout, names))
}

fn parse_position(s: &str) -> PointPosition {
    if s == "reverse" {
        PointPosition::Reverse
    } else {
        PointPosition::Normal
    }
}

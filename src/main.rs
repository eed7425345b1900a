use signalsense::*;
use std::path::PathBuf;
use structopt::StructOpt;

/// SignalSense -- railway station resource simulation
#[derive(StructOpt, Debug)]
#[structopt(name = "signalsense")]
struct Opt {
    /// Verbose mode (-v, -vv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Station layout file
    #[structopt(parse(from_os_str))]
    layout: PathBuf,

    /// Timetable file
    #[structopt(parse(from_os_str))]
    timetable: PathBuf,

    /// Extra ticks to run after the timetable is exhausted
    #[structopt(short = "t", long = "ticks", default_value = "30")]
    ticks: u64,

    /// Seed for the departure random source
    #[structopt(short = "s", long = "seed", default_value = "0")]
    seed: u64,

    /// Per-tick departure probability for stopped trains (0 disables chance
    /// departures; only explicit depart actions move trains out)
    #[structopt(short = "p", long = "departures", default_value = "0.2")]
    departures: f64,

    /// Output JSON event history file
    #[structopt(short = "j", long = "json", parse(from_os_str))]
    json: Option<PathBuf>,

    /// Print a station snapshot after the run
    #[structopt(long = "snapshot")]
    snapshot: Option<String>,

    /// Output JSON snapshot file (with --snapshot)
    #[structopt(long = "json-snapshot", parse(from_os_str))]
    json_snapshot: Option<PathBuf>,
}

fn run(opt: &Opt) -> AppResult<()> {
    let (layout, names) = get_layout(&opt.layout)?;
    if opt.verbose >= 2 {
        println!("Layout:");
        println!("  Stations:");
        for x in &layout.stations {
            println!("    * {:?}", x);
        }
        println!("  Points:");
        for x in &layout.points {
            println!("    * {:?}", x);
        }
        println!("  Signals:");
        for x in &layout.signals {
            println!("    * {:?}", x);
        }
        println!("  Routes:");
        for x in &layout.routes {
            println!("    * {:?}", x);
        }
    }

    let timetable = get_timetable(&opt.timetable)?;
    if opt.verbose >= 1 {
        println!("Timetable:");
        for x in &timetable.actions {
            println!("  - {:?}", x);
        }
        println!("");
    }

    let rng: Box<dyn station::random::RandomSource> = if opt.departures > 0.0 {
        Box::new(station::random::SeededDepartures::new(opt.seed, opt.departures))
    } else {
        Box::new(station::random::NoDepartures)
    };

    let mut control = run_scenario(&layout, &names, &timetable, opt.ticks, rng);

    println!("# Station history:");
    for record in control.log.records() {
        println!("> {:?}", record);
    }

    if let Some(ref code) = opt.snapshot {
        control.select_station(code)?;
        let snap = control.selected_snapshot()?;
        println!("# Snapshot of {}:", code);
        println!("{:#?}", snap);

        if let Some(ref path) = opt.json_snapshot {
            use std::fs::File;
            use std::io::BufWriter;
            let file = File::create(path)?;
            let mut writer = BufWriter::new(&file);
            output::json::json_snapshot(&control, &snap, &mut writer)?;
        }
    }

    if let Some(ref path) = opt.json {
        use std::fs::File;
        use std::io::BufWriter;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(&file);
        output::json::json_history(&control, &mut writer)?;
    }

    Ok(())
}

pub fn main() {
    env_logger::init();
    let opt = Opt::from_args();
    match run(&opt) {
        Ok(()) => {}
        Err(e) => {
            println!("Error:\n{}", e.as_fail());
            std::process::exit(1);
        }
    }
}

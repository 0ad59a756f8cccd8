#[macro_use]
extern crate log;

use std::io::BufRead;

use clap::{App, Arg, ArgMatches};
use hal::time::Clock;
use pro_vario::components::{LogTelemetry, Sampler, ToggleControl};
use pro_vario::config::{Config, Setter};
use pro_vario::runtime::{self, SystemClock, ThreadSleep};
use pro_vario::{logger, VarioState};
use simulator::atmosphere::{Atmosphere, Profile, Thermal};
use simulator::console::{ConsoleBuzzer, ConsoleLed};

const LOG_BUFFER_SIZE: usize = 64 * 1024;

fn parse<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, String> {
    match matches.value_of(name) {
        Some(value) => value.parse().map(Some).map_err(|_| format!("Invalid {}: {}", name, value)),
        None => Ok(None),
    }
}

fn load_config(matches: &ArgMatches) -> Result<Config, String> {
    let mut config = match matches.value_of("config") {
        Some(path) => {
            let file = std::fs::File::open(path)
                .map_err(|e| format!("Read config file {} failed: {}", path, e))?;
            serde_json::from_reader(std::io::BufReader::new(file))
                .map_err(|e| format!("Malformed config file {}: {}", path, e))?
        }
        None => Config::default(),
    };
    for line in matches.values_of("set").into_iter().flatten() {
        config.set_line(line).map_err(|e| format!("{}: {}", line, e))?;
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn profile(matches: &ArgMatches) -> Result<Profile, String> {
    let mut profile = Profile::default();
    profile.climb = parse(matches, "climb")?.unwrap_or(0.0);
    profile.start_altitude = parse(matches, "altitude")?.unwrap_or(0.0);
    profile.dropout = parse(matches, "dropout")?;
    if let Some(amplitude) = parse(matches, "thermal")? {
        profile.thermal = Some(Thermal { amplitude, period: 20.0 });
    }
    Ok(profile)
}

/// Every line on stdin is a button press, `log` dumps the log buffer.
fn button(control: &mut ToggleControl<'static, ConsoleLed>) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => return,
        };
        if line.trim() == "log" {
            let mut dump = String::new();
            logger::dump(&mut dump).ok();
            print!("{}", dump);
            continue;
        }
        control.on_falling_edge(SystemClock.now());
    }
}

fn run(matches: &ArgMatches) -> Result<(), String> {
    let level = match matches.is_present("verbose") {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    };
    logger::init(LOG_BUFFER_SIZE, runtime::uptime, true, level);

    let config = load_config(matches)?;
    let profile = profile(matches)?;
    let base_pressure = config.measurement.base_pressure;
    let state: &'static VarioState =
        Box::leak(Box::new(VarioState::new(base_pressure, matches.is_present("start"))));
    let led: &'static ConsoleLed = Box::leak(Box::new(ConsoleLed::default()));

    runtime::spawn_audio(config.audio, state, ConsoleBuzzer::default(), led)
        .map_err(|e| format!("Spawn audio thread failed: {}", e))?;
    let mut control = ToggleControl::new(config.debounce(), state, led);
    std::thread::Builder::new()
        .name("button".into())
        .spawn(move || button(&mut control))
        .map_err(|e| format!("Spawn button thread failed: {}", e))?;

    let barometer = Atmosphere::new(profile, base_pressure, SystemClock);
    let mut sampler = Sampler::start(&config, state, barometer, LogTelemetry, SystemClock, ())
        .map_err(|e| e.to_string())?;
    info!("Sampling at {} Hz, press enter to toggle", config.measurement.sample_rate);
    sampler.run(&mut ThreadSleep)
}

fn main() {
    let matches = App::new("simulator")
        .version("0.1")
        .author("qiuchengxuan")
        .about("Paragliding variometer simulator")
        .arg(Arg::with_name("config").long("config").help("JSON config file").takes_value(true))
        .arg(
            Arg::with_name("set")
                .long("set")
                .help("Override config entry, e.g. audio.positive-threshold=0.2")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(Arg::with_name("climb").long("climb").help("Climb rate m/s").takes_value(true))
        .arg(Arg::with_name("altitude").long("altitude").help("Start altitude m").takes_value(true))
        .arg(Arg::with_name("thermal").long("thermal").help("Thermal amplitude m").takes_value(true))
        .arg(Arg::with_name("dropout").long("dropout").help("Fail every n-th read").takes_value(true))
        .arg(Arg::with_name("start").long("start").help("Start with the vario turned on"))
        .arg(Arg::with_name("verbose").short("v").long("verbose").help("Debug logging"))
        .get_matches();
    if let Err(error) = run(&matches) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

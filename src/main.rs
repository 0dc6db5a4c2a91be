//! Response Timing - command-line front end
//!
//! Runs keyboard reaction trials and mouse tracking against the live
//! devices, or correlates a recorded event stream.

mod cli;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

use cli::{Cli, Commands, ReactArgs, TrackArgs};
use response_timing::config::{config_path, Config};
use response_timing::hub::replay::read_events;
use response_timing::{
    share, ButtonQuery, ButtonRecord, DeviceHub, KeyQuery, KeyRecord, KeyTrigger, Keyboard,
    LiveHub, MotionSample, Mouse, Point, ReplayHub, TimingError, TrialReport, WaitOptions,
};

/// Records gathered by one command
#[derive(Default)]
struct Collected {
    keys: Vec<KeyRecord>,
    buttons: Vec<ButtonRecord>,
    motion: Vec<MotionSample>,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };
    debug!("loaded configuration: {:?}", config);
    Ok(config)
}

/// Flag raised by ctrl-c, checked by blocking waits and loops
fn install_cancel_flag() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))
        .context("failed to install ctrl-c handler")?;
    Ok(flag)
}

fn print_key(record: &KeyRecord) {
    match (record.t_down, record.duration) {
        (Some(t), Some(d)) => println!("  {:<10} {:>8.3} s  held {:.3} s", record.key, t, d),
        (Some(t), None) => println!("  {:<10} {:>8.3} s", record.key, t),
        (None, _) => println!(
            "  {:<10} released at {:.3} s",
            record.key,
            record.t_up.unwrap_or(0.0)
        ),
    }
}

fn print_button(record: &ButtonRecord) {
    let at = |p: Option<Point>| {
        p.map(|p| format!("({:.2}, {:.2})", p.x, p.y))
            .unwrap_or_else(|| "-".to_string())
    };
    println!(
        "  {:<6} down {} {}  up {} {}  drag {}",
        record.button,
        record.t_down.map_or("-".to_string(), |t| format!("{t:.3} s")),
        at(record.pos_down),
        record.t_up.map_or("-".to_string(), |t| format!("{t:.3} s")),
        at(record.pos_up),
        record.drag.as_ref().map_or(0, Vec::len),
    );
}

fn react(args: &ReactArgs, config: &Config) -> Result<Collected> {
    let cancel = install_cancel_flag()?;
    let hub = share(
        LiveHub::new(config.monitor_geometry()?).with_buffer_capacity(config.hub.buffer_capacity),
    );
    let mut keyboard = Keyboard::new(hub.clone());

    let keys = if args.keys.is_empty() {
        config.keyboard.key_list.clone()
    } else {
        args.keys.clone()
    };
    let query = KeyQuery::new()
        .keys(&keys)
        .release_as_unique(config.keyboard.release_as_unique);
    let mut options = WaitOptions::default()
        .cancel_on(cancel)
        .poll_interval(config.poll_interval());
    if let Some(timeout) = args.timeout {
        options = options.timeout(timeout);
    }

    let mut collected = Collected::default();
    for trial in 1..=args.trials {
        println!("Trial {}/{}: respond now", trial, args.trials);
        match keyboard.wait_keys(&query, KeyTrigger::Down, &options) {
            Ok(records) => {
                records.iter().for_each(print_key);
                collected.keys.extend(records);
            }
            Err(TimingError::WaitTimedOut { after }) => {
                warn!("trial {} timed out", trial);
                println!("  no response within {:.3} s", after);
            }
            Err(TimingError::WaitCancelled) => {
                info!("reaction trials cancelled after {} trial(s)", trial - 1);
                break;
            }
            Err(e) => {
                hub.borrow_mut().shutdown();
                return Err(e.into());
            }
        }
    }

    hub.borrow_mut().shutdown();
    Ok(collected)
}

fn track(args: &TrackArgs, config: &Config) -> Result<Collected> {
    let cancel = install_cancel_flag()?;
    let hub = share(
        LiveHub::new(config.monitor_geometry()?).with_buffer_capacity(config.hub.buffer_capacity),
    );
    let units = args.units.unwrap_or(config.mouse.units);
    let mut mouse = Mouse::new(hub.clone(), units);

    println!("Tracking the mouse for {:.1} s (ctrl-c stops early)", args.seconds);
    let interval = config.poll_interval();
    let mut collected = Collected::default();
    while mouse.time_base().elapsed(hub.borrow().now()) < args.seconds {
        if cancel.load(Ordering::Relaxed) {
            info!("tracking cancelled");
            break;
        }
        hub.borrow_mut().poll();
        // Motion is drained as it arrives so the buffer stays small
        collected.motion.extend(mouse.get_motion(None, None)?);
        thread::sleep(interval);
    }

    let query = ButtonQuery::new()
        .buttons(&config.mouse.buttons)
        .include_drag(args.drag || config.mouse.include_drag);
    collected.buttons = mouse.get_buttons(&query)?;
    hub.borrow_mut().shutdown();

    println!(
        "{} click(s), {} motion sample(s) in {}",
        collected.buttons.len(),
        collected.motion.len(),
        units
    );
    collected.buttons.iter().for_each(print_button);
    Ok(collected)
}

fn replay(file: &Path, config: &Config) -> Result<Collected> {
    let events = read_events(file)
        .with_context(|| format!("failed to read recording {}", file.display()))?;
    info!("replaying {} event(s) from {}", events.len(), file.display());

    let hub = share(ReplayHub::new(config.monitor_geometry()?));
    let mut keyboard = Keyboard::new(hub.clone());
    let mut mouse = Mouse::new(hub.clone(), config.mouse.units);
    hub.borrow_mut().schedule_all(events);
    hub.borrow_mut().run_to_end();

    let key_query = KeyQuery::new()
        .keys(&config.keyboard.key_list)
        .release_as_unique(config.keyboard.release_as_unique);
    let button_query = ButtonQuery::new()
        .buttons(&config.mouse.buttons)
        .include_drag(config.mouse.include_drag);

    let collected = Collected {
        keys: keyboard.get_keys(&key_query),
        buttons: mouse.get_buttons(&button_query)?,
        motion: mouse.get_motion(None, None)?.collect(),
    };
    hub.borrow_mut().shutdown();

    println!("Keys:");
    collected.keys.iter().for_each(print_key);
    println!("Buttons:");
    collected.buttons.iter().for_each(print_button);
    println!("Motion: {} sample(s)", collected.motion.len());
    Ok(collected)
}

fn show_config(config: &Config, write: bool) -> Result<()> {
    print!("{}", toml::to_string_pretty(config).context("failed to render config")?);
    if write {
        config.save().context("failed to save config")?;
        println!("# saved to {}", config_path()?.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(cli.config.as_deref())?;

    let (label, collected) = match &cli.command {
        Commands::React(args) => ("react", react(args, &config)?),
        Commands::Track(args) => ("track", track(args, &config)?),
        Commands::Replay { file } => ("replay", replay(file, &config)?),
        Commands::Config { write } => return show_config(&config, *write),
    };

    if let Some(path) = &cli.export {
        let report = TrialReport::new(label, collected.keys, collected.buttons, collected.motion);
        report
            .export_json(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

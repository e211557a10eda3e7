//! Shield simulator host
//!
//! Reads bridge messages from stdin, one per line, and drives a controller
//! with them. Besides JSON messages a line may be `tick <ms>` to advance the
//! repeat timers, or a `#` comment.
//!
//! ```text
//! {"type":"button-down","buttonId":"a"}
//! tick 600
//! {"type":"button-up","buttonId":"a"}
//! ```

use std::io::{self, BufRead};
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use arcade_input::selftest::SelfTest;
use arcade_input::{
    Bridge, ButtonEvent, Controller, InputConfig, PresenceEvent, QueuedRelay, RelaySink,
    TickClock, build_info,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shield-sim", version, about = "Drive the button input stack from stdin")]
struct Args {
    /// Configuration profile (config/{profile}.toml); falls back to
    /// $ARCADE_PROFILE, then "release"
    #[arg(long)]
    profile: Option<String>,

    /// Forward bridged button events over the relay instead of raising them locally
    #[arg(long)]
    relay: bool,

    /// Raise system-band keys instead of user-band keys
    #[arg(long)]
    system_events: bool,

    /// Advance repeat timers from the wall clock between lines
    #[arg(long)]
    realtime: bool,

    /// Run the self test and exit
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.check {
        let report = SelfTest::standard().run();
        println!("{}", report.render());
        println!("{}", build_info::detailed_info());
        std::process::exit(report.exit_code());
    }

    info!(version = %build_info::version_string(), "Starting shield simulator");

    let config = match &args.profile {
        Some(profile) => InputConfig::load(profile)
            .with_context(|| format!("loading profile '{}'", profile))?,
        None => InputConfig::load_from_env().context("loading profile from $ARCADE_PROFILE")?,
    };

    let relay = Rc::new(QueuedRelay::new());
    let controller = Controller::from_config(&config, Some(relay.clone() as Rc<dyn RelaySink>));
    if args.system_events {
        controller.set_user_events_enabled(false);
    }
    log_events(&controller);

    let bridge = Bridge::new(&controller, args.relay || config.relay.enabled);
    let mut clock = TickClock::new();
    clock.tick(Instant::now());

    for (number, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("reading stdin")?;
        let line = line.trim();

        if args.realtime {
            controller.update(clock.tick(Instant::now()));
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(ms) = line.strip_prefix("tick ") {
            let ms = ms
                .trim()
                .parse::<i64>()
                .with_context(|| format!("line {}: bad tick '{}'", number + 1, ms))?;
            controller.update(ms);
        } else if let Err(e) = bridge.handle_json(line) {
            warn!(line = number + 1, error = %e, "Skipping message");
        }

        for packet in relay.drain() {
            println!("relay {:02x?}", packet.encode());
        }
    }

    info!(connected = controller.connected(), "Input closed");
    Ok(())
}

fn log_events(controller: &Controller) {
    for button in controller.buttons() {
        for event in ButtonEvent::ALL {
            let id = button.id();
            button.add_event_listener(event, Rc::new(move || info!(button = %id, ?event, "Event")));
        }
    }

    controller.on_presence(PresenceEvent::Present, Rc::new(|| info!("Shield present")));
    controller.on_presence(PresenceEvent::Absent, Rc::new(|| info!("Shield absent")));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_flag_is_optional() {
        let args = Args::try_parse_from(["shield-sim"]).unwrap();
        assert_eq!(args.profile, None);
        assert!(!args.relay && !args.check);

        let args = Args::try_parse_from(["shield-sim", "--profile", "debug", "--relay"]).unwrap();
        assert_eq!(args.profile.as_deref(), Some("debug"));
        assert!(args.relay);
    }
}

//! Start-up self test for the input stack
//!
//! Runs a handful of checks (configuration profiles, controller wiring, build
//! metadata) and renders the outcome as a table. Used by `shield-sim --check`
//! and by CI.
//!
//! # Example
//!
//! ```no_run
//! use arcade_input::selftest::{SelfTest, Check};
//!
//! let report = SelfTest::new()
//!     .with(Check::ConfigProfiles(vec!["debug", "release"]))
//!     .with(Check::ControllerWiring)
//!     .run();
//!
//! if report.is_healthy() {
//!     println!("{}", report.render());
//! }
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::bus::LocalBus;
use crate::build_info;
use crate::config::InputConfig;
use crate::controller::Controller;
use crate::keys::{ButtonEvent, ButtonId};
use crate::settings::InputSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Pass | Status::Warn)
    }

    fn colored(self) -> String {
        match self {
            Status::Pass => "PASS".green().to_string(),
            Status::Warn => "WARN".yellow().to_string(),
            Status::Fail => "FAIL".red().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub check: &'static str,
    pub status: Status,
    pub message: String,
    pub duration: Duration,
}

/// Checks the self test knows how to run
#[derive(Debug, Clone)]
pub enum Check {
    /// Every listed profile loads through the config layer
    ConfigProfiles(Vec<&'static str>),
    /// Every wired button round-trips press/release on a scratch bus
    ControllerWiring,
    /// Build metadata was captured
    BuildInfo,
}

impl Check {
    fn name(&self) -> &'static str {
        match self {
            Check::ConfigProfiles(_) => "Configuration",
            Check::ControllerWiring => "Controller wiring",
            Check::BuildInfo => "Build info",
        }
    }

    fn run(&self) -> (Status, String) {
        match self {
            Check::ConfigProfiles(profiles) => check_profiles(profiles),
            Check::ControllerWiring => check_wiring(),
            Check::BuildInfo => (Status::Pass, build_info::version_string()),
        }
    }
}

fn check_profiles(profiles: &[&'static str]) -> (Status, String) {
    let failed: Vec<String> = profiles
        .iter()
        .filter_map(|profile| {
            InputConfig::load(profile)
                .err()
                .map(|e| format!("{}: {}", profile, e))
        })
        .collect();

    if failed.is_empty() {
        (Status::Pass, format!("{} profiles loaded", profiles.len()))
    } else {
        (Status::Fail, failed.join("; "))
    }
}

fn check_wiring() -> (Status, String) {
    let controller = Controller::new(LocalBus::shared(), InputSettings::default().shared(), None);
    let seen = Rc::new(RefCell::new(Vec::new()));
    for event in [ButtonEvent::Pressed, ButtonEvent::Released] {
        let seen = Rc::clone(&seen);
        controller
            .any()
            .add_event_listener(event, Rc::new(move || seen.borrow_mut().push(event)));
    }

    let mut dead = Vec::new();
    for &id in ButtonId::WIRED.iter() {
        seen.borrow_mut().clear();
        controller.press(id);
        controller.release(id);
        if *seen.borrow() != [ButtonEvent::Pressed, ButtonEvent::Released] {
            dead.push(id.to_string());
        }
    }

    if !dead.is_empty() {
        return (Status::Fail, format!("no events from buttons {}", dead.join(", ")));
    }
    if !controller.connected() {
        return (Status::Warn, "buttons respond but controller not connected".into());
    }
    (Status::Pass, format!("{} buttons respond", ButtonId::WIRED.len()))
}

/// Results of a self test run
#[derive(Debug)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn failed(&self) -> usize {
        self.count(Status::Fail)
    }

    pub fn warned(&self) -> usize {
        self.count(Status::Warn)
    }

    fn count(&self, status: Status) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn is_healthy(&self) -> bool {
        self.failed() == 0
    }

    /// 0 = all pass, 1 = any fail, 2 = any warn (but no fail)
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 {
            1
        } else if self.warned() > 0 {
            2
        } else {
            0
        }
    }

    pub fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Check", "Status", "Duration", "Message"]);
        for outcome in &self.outcomes {
            builder.push_record([
                outcome.check.to_string(),
                outcome.status.colored(),
                format!("{:.2?}", outcome.duration),
                outcome.message.clone(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let overall = if !self.is_healthy() {
            "UNHEALTHY".red().bold()
        } else if self.warned() > 0 {
            "HEALTHY (with warnings)".yellow().bold()
        } else {
            "HEALTHY".green().bold()
        };
        format!("{}\n\n  Overall: {}\n", table, overall)
    }
}

#[derive(Debug, Default)]
pub struct SelfTest {
    checks: Vec<Check>,
}

impl SelfTest {
    pub fn new() -> Self {
        Self::default()
    }

    /// The checks `shield-sim --check` runs
    pub fn standard() -> Self {
        Self::new()
            .with(Check::ConfigProfiles(vec!["debug", "release"]))
            .with(Check::ControllerWiring)
            .with(Check::BuildInfo)
    }

    pub fn with(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn run(self) -> Report {
        let outcomes = self
            .checks
            .iter()
            .map(|check| {
                let start = Instant::now();
                let (status, message) = check.run();
                Outcome {
                    check: check.name(),
                    status,
                    message,
                    duration: start.elapsed(),
                }
            })
            .collect();
        Report { outcomes }
    }
}

//! Replays a recorded input script against the engine without a display.
//!
//! Each line of the script is a JSON object with a timestamp (milliseconds
//! from the start of the script) and an event in the socket wire format:
//!
//! ```json
//! { "at_ms": 0,   "event": { "PointerDown": { "x": 2, "y": 540 } } }
//! { "at_ms": 40,  "event": { "PointerMove": { "x": 120, "y": 540 } } }
//! { "at_ms": 60,  "event": { "PointerUp": { "x": 180 } } }
//! ```
//!
//! Frames are stepped every 16 ms of script time.  Every window request the
//! engine makes is printed, followed by the final window bounds.  Blank
//! lines and lines starting with `#` are ignored.
//!
//! Run with:
//!     edgebar-replay [--config <path>] [script.jsonl]
//!
//! The script is read from stdin when no path is given.  Saving the anchor
//! offset never touches the config file.

use edgebar::config::{Config, FALLBACK_DISPLAY};
use edgebar::engine::InteractionEngine;
use edgebar::event::InputEvent;
use edgebar::host::channel::ChannelHost;
use edgebar::host::window::HostWindow;
use edgebar::host::HostRequest;
use edgebar::sync::FRAME_INTERVAL;
use edgebar::traits::ConfigStore;
use log::{error, info};
use serde::Deserialize;
use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// How long to keep stepping frames after the last scripted event.
const SETTLE_TIME: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
enum ReplayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: at_ms {at_ms} is earlier than the previous step")]
    OutOfOrder { line: usize, at_ms: u64 },
    #[error("config error: {0}")]
    Config(#[from] edgebar::config::ConfigError),
    #[error("{0}\nusage: edgebar-replay [--config <path>] [script.jsonl]")]
    Usage(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Step {
    at_ms: u64,
    event: InputEvent,
}

fn parse_script(reader: impl BufRead) -> Result<Vec<Step>, ReplayError> {
    let mut steps: Vec<Step> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let step: Step =
            serde_json::from_str(text).map_err(|source| ReplayError::Parse { line: i + 1, source })?;
        if steps.last().is_some_and(|prev| step.at_ms < prev.at_ms) {
            return Err(ReplayError::OutOfOrder {
                line: i + 1,
                at_ms: step.at_ms,
            });
        }
        steps.push(step);
    }
    Ok(steps)
}

//  In-memory store

/// Keeps the config in memory so a replay never rewrites the user's file.
struct ReplayStore {
    config: RefCell<Config>,
    subscribers: RefCell<Vec<mpsc::Sender<Config>>>,
}

impl ReplayStore {
    fn new(mut config: Config) -> Self {
        if config.display_bounds.is_none() {
            config.display_bounds = Some(FALLBACK_DISPLAY);
        }
        Self {
            config: RefCell::new(config),
            subscribers: RefCell::new(Vec::new()),
        }
    }
}

impl ConfigStore for ReplayStore {
    type Error = std::convert::Infallible;

    fn load(&self) -> Result<Config, Self::Error> {
        Ok(self.config.borrow().clone())
    }

    fn save_anchor_offset(&self, offset: i32) -> Result<(), Self::Error> {
        info!("anchor offset would be saved as {}", offset);
        self.config.borrow_mut().transforms.posy = Some(offset as f64);
        let config = self.config.borrow().clone();
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(config.clone()).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<Config> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }
}

//  Replay

fn describe(request: &HostRequest) -> String {
    match request {
        HostRequest::Resize { width, height, y } => match y {
            Some(y) => format!("resize {}x{} y={}", width, height, y),
            None => format!("resize {}x{}", width, height),
        },
        HostRequest::SetIgnoreMouse { ignore, forward } => {
            format!("ignore-mouse {} forward={}", ignore, forward)
        }
        HostRequest::MoveBy { delta_y } => format!("move-by {}", delta_y),
        HostRequest::KeepOnTop(on) => format!("keep-on-top {}", on),
        HostRequest::QueryAnchorOffset { .. } => "query-anchor-offset".into(),
    }
}

/// Drive the engine through `steps`, writing one line per host request.
fn replay(steps: &[Step], config: Config, out: &mut impl Write) -> Result<HostWindow, ReplayError> {
    let (host, host_rx) = ChannelHost::pair();
    let mut engine = InteractionEngine::new(host, ReplayStore::new(config));
    let settings = engine.settings().clone();
    let mut window = HostWindow::new(
        settings.display,
        settings.anchor_offset,
        settings.metrics.collapsed_height,
    );

    let base = Instant::now();
    let at = |ms: Duration| base + ms;
    let mut clock = Duration::ZERO;

    let drain = |window: &mut HostWindow, clock: Duration, out: &mut dyn Write| {
        for request in host_rx.try_iter() {
            writeln!(out, "{:>6} ms  {}", clock.as_millis(), describe(&request))?;
            window.apply(request);
        }
        Ok::<(), std::io::Error>(())
    };

    engine.start(at(clock));
    drain(&mut window, clock, out)?;

    for step in steps {
        let due = Duration::from_millis(step.at_ms);
        while clock + FRAME_INTERVAL <= due {
            clock += FRAME_INTERVAL;
            engine.on_frame(at(clock));
            drain(&mut window, clock, out)?;
        }
        writeln!(out, "{:>6} ms  << {:?}", step.at_ms, step.event)?;
        engine.handle(step.event.clone(), at(due));
        drain(&mut window, clock, out)?;
    }

    let end = clock + SETTLE_TIME;
    while clock < end {
        clock += FRAME_INTERVAL;
        engine.on_frame(at(clock));
        drain(&mut window, clock, out)?;
    }

    writeln!(
        out,
        "final: progress={:.3} expanded={} bounds={:?}",
        engine.progress(),
        engine.is_expanded(),
        window.bounds()
    )?;
    Ok(window)
}

//  Main

/// `(config, script)` paths from the command line.
fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(Option<PathBuf>, Option<PathBuf>), ReplayError> {
    let mut config_path = None;
    let mut script_path = None;
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args
                .next()
                .ok_or_else(|| ReplayError::Usage("--config needs a path".into()))?;
            config_path = Some(PathBuf::from(path));
        } else if arg.starts_with("--") {
            return Err(ReplayError::Usage(format!("unknown argument: {}", arg)));
        } else if script_path.is_some() {
            return Err(ReplayError::Usage(format!("unexpected argument: {}", arg)));
        } else {
            script_path = Some(PathBuf::from(arg));
        }
    }
    Ok((config_path, script_path))
}

fn run() -> Result<(), ReplayError> {
    let (config_path, script_path) = parse_args(std::env::args().skip(1))?;

    let config = match config_path {
        Some(p) => Config::load(&p)?,
        None => Config::default(),
    };

    let steps = match script_path {
        Some(p) => parse_script(BufReader::new(std::fs::File::open(p)?))?,
        None => parse_script(std::io::stdin().lock())?,
    };
    info!("replaying {} step(s)", steps.len());

    let stdout = std::io::stdout();
    replay(&steps, config, &mut stdout.lock())?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use edgebar::event::PointerTarget;

    #[test]
    fn script_skips_blank_and_comment_lines() {
        let script = "# open by dragging\n\n\
            {\"at_ms\": 0, \"event\": {\"PointerDown\": {\"x\": 2, \"y\": 540}}}\n\
            {\"at_ms\": 30, \"event\": \"Toggle\"}\n";
        let steps = parse_script(script.as_bytes()).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[0].event,
            InputEvent::PointerDown {
                x: 2.0,
                y: 540.0,
                target: PointerTarget::Panel
            }
        );
        assert_eq!(steps[1].at_ms, 30);
    }

    #[test]
    fn bad_line_reports_its_number() {
        let script = "{\"at_ms\": 0, \"event\": \"Toggle\"}\nnope\n";
        match parse_script(script.as_bytes()) {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn steps_must_not_go_back_in_time() {
        let script = "{\"at_ms\": 50, \"event\": \"Toggle\"}\n{\"at_ms\": 10, \"event\": \"Toggle\"}\n";
        assert!(matches!(
            parse_script(script.as_bytes()),
            Err(ReplayError::OutOfOrder { line: 2, at_ms: 10 })
        ));
    }

    #[test]
    fn command_line_is_checked() {
        let args = |a: &[&str]| parse_args(a.iter().map(|s| s.to_string()));
        let (config, script) = args(&["--config", "c.json", "s.jsonl"]).unwrap();
        assert_eq!(config, Some(PathBuf::from("c.json")));
        assert_eq!(script, Some(PathBuf::from("s.jsonl")));

        assert!(matches!(args(&["--config"]), Err(ReplayError::Usage(_))));
        assert!(matches!(args(&["--fast"]), Err(ReplayError::Usage(_))));
        assert!(matches!(args(&["a.jsonl", "b.jsonl"]), Err(ReplayError::Usage(_))));
    }

    #[test]
    fn toggle_script_ends_expanded() {
        let steps = vec![Step {
            at_ms: 0,
            event: InputEvent::Toggle,
        }];
        let mut out = Vec::new();
        let window = replay(&steps, Config::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("keep-on-top true"));
        assert!(text.contains("final: progress=1.000 expanded=true"));
        // Expanded window: panel width plus padding.
        assert_eq!(window.bounds().width, 500);
    }

    #[test]
    fn empty_script_stays_collapsed() {
        let mut out = Vec::new();
        let window = replay(&[], Config::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("expanded=false"));
        assert_eq!(window.bounds().width, 20);
    }
}

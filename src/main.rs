//! Entry point for the **edgebar** daemon.
//!
//! Spawns the Unix-socket [`InputSource`](edgebar::traits::InputSource) on a
//! background thread and drives the interaction engine on the main thread.
//!
//! When the `frontend-gtk` feature is enabled the main thread runs the GLib
//! main loop (GTK4 requires it).  Without the feature, or with `--headless`,
//! a plain frame loop applies window requests to an in-memory
//! [`HostWindow`](edgebar::host::window::HostWindow) and logs them.
//!
//! ```text
//! edgebar [--config <path>] [--socket <path>] [--headless]
//! ```

use edgebar::config::{config_dir, default_config_path, FALLBACK_DISPLAY};
use edgebar::engine::InteractionEngine;
use edgebar::event::TimedEvent;
use edgebar::host::channel::ChannelHost;
use edgebar::host::window::HostWindow;
use edgebar::ipc::listener::{default_socket_path, UnixSocketListener};
use edgebar::store::JsonConfigStore;
use edgebar::sync::FRAME_INTERVAL;
use edgebar::traits::InputSource;
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

const USAGE: &str = "usage: edgebar [--config <path>] [--socket <path>] [--headless]";

#[derive(Debug, PartialEq)]
struct Args {
    config: PathBuf,
    socket: PathBuf,
    headless: bool,
}

/// Parse the command line (without the program name).
fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args {
        config: default_config_path(),
        socket: default_socket_path(),
        headless: false,
    };
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                args.config = it.next().map(PathBuf::from).ok_or("--config needs a path")?;
            }
            "--socket" => {
                args.socket = it.next().map(PathBuf::from).ok_or("--socket needs a path")?;
            }
            "--headless" => args.headless = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(args)
}

//  Main

fn main() {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    info!("config file: {}", args.config.display());

    let (event_tx, event_rx) = mpsc::channel::<TimedEvent>();
    spawn_input_sources(event_tx, args.socket);

    let store = JsonConfigStore::new(&args.config);
    if args.headless {
        run_headless(store, event_rx);
    } else {
        start_event_loop(store, event_rx);
    }
}

//  Event loops

#[cfg(feature = "frontend-gtk")]
fn start_event_loop(store: JsonConfigStore, event_rx: mpsc::Receiver<TimedEvent>) {
    edgebar::frontend::gtk::run_main_loop(store, event_rx, Some(config_dir().join("style.css")));
}

#[cfg(not(feature = "frontend-gtk"))]
fn start_event_loop(store: JsonConfigStore, event_rx: mpsc::Receiver<TimedEvent>) {
    info!("built without a frontend, running headless");
    run_headless(store, event_rx);
}

/// Frame loop without a window system.
fn run_headless(store: JsonConfigStore, event_rx: mpsc::Receiver<TimedEvent>) {
    info!("edgebar running headless (config dir {})", config_dir().display());
    let store = store.with_displays(vec![FALLBACK_DISPLAY]);

    let (host, host_rx) = ChannelHost::pair();
    let mut engine = InteractionEngine::new(host, store);
    let settings = engine.settings().clone();
    let mut window = HostWindow::new(
        settings.display,
        settings.anchor_offset,
        settings.metrics.collapsed_height,
    );

    engine.start(Instant::now());
    let mut next_frame = Instant::now() + FRAME_INTERVAL;

    loop {
        let timeout = next_frame.saturating_duration_since(Instant::now());
        match event_rx.recv_timeout(timeout) {
            Ok(timed) => engine.handle(timed.event, timed.at),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        if now >= next_frame {
            engine.on_frame(now);
            next_frame = now + FRAME_INTERVAL;
        }

        if window.display() != engine.settings().display {
            let s = engine.settings();
            window.set_display(s.display, s.anchor_offset);
        }
        for request in host_rx.try_iter() {
            debug!("{:?}", request);
            window.apply(request);
        }
    }
    info!("all input sources closed, exiting ({:?})", window.bounds());
}

//  Helpers

fn spawn_input_sources(tx: mpsc::Sender<TimedEvent>, socket: PathBuf) {
    {
        let tx = tx.clone();
        std::thread::spawn(move || {
            let mut source = UnixSocketListener::new(&socket);
            if let Err(e) = source.run(tx) {
                error!("socket listener error: {}", e);
            }
        });
    }

    // Pointer, focus and drag input from the overlay window itself is
    // handled on the main thread by the frontend.

    drop(tx);
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        parse_args(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn no_arguments_use_the_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.config, default_config_path());
        assert_eq!(args.socket, default_socket_path());
        assert!(!args.headless);
    }

    #[test]
    fn flags_with_values() {
        let args = parse(&["--headless", "--config", "/tmp/c.json", "--socket", "/tmp/s.sock"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/tmp/c.json"));
        assert_eq!(args.socket, PathBuf::from("/tmp/s.sock"));
        assert!(args.headless);
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert_eq!(parse(&["--config"]), Err("--config needs a path".to_string()));
        assert!(parse(&["--socket"]).is_err());
        assert_eq!(parse(&["--verbose"]), Err("unknown argument: --verbose".to_string()));
    }
}

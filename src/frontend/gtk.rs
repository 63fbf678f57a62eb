//! GTK4 + layer-shell overlay that runs on the **main thread**.
//!
//! # Widget tree
//!
//! ```text
//! window                    (layer-shell, anchored top-left, transparent)
//! └ gtk4::Overlay
//!     ├ gtk4::DrawingArea   (panel, painted with cairo)
//!     └ .drop-zone          (label shown while an external drag hovers)
//! ```
//!
//! The window is positioned through layer-shell margins computed by
//! [`HostWindow`].  Click-through is implemented with the surface input
//! region: while the engine asks to ignore the mouse, only the panel (or
//! collapsed strip) accepts input and everything else falls through.
//!
//! # CSS selectors
//!
//! | Selector     | Targets                                  |
//! |--------------|------------------------------------------|
//! | `window`     | The overlay window (keep transparent)    |
//! | `.drop-zone` | Hint shown while files are dragged over  |

use crate::engine::InteractionEngine;
use crate::event::{InputEvent, TimedEvent};
use crate::geometry::{Point, Rect};
use crate::host::channel::ChannelHost;
use crate::host::window::HostWindow;
use crate::host::HostRequest;
use crate::panel::{PanelLayout, PanelStyle};
use crate::store::JsonConfigStore;
use crate::sync::FRAME_INTERVAL;
use gtk4::cairo::{Context, RectangleInt, Region};
use gtk4::prelude::*;
use gtk4::{gdk, glib};
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::f64::consts::{FRAC_PI_2, PI};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Instant;

type Engine = InteractionEngine<ChannelHost, JsonConfigStore>;

//  Default CSS

const DEFAULT_CSS: &str = r#"
window,
window.background {
    background-color: transparent;
    background: none;
}

.drop-zone {
    color: rgba(40, 40, 40, 0.9);
    background-color: rgba(255, 255, 255, 0.6);
    border: 2px dashed rgba(40, 40, 40, 0.5);
    border-radius: 12px;
    padding: 24px 32px;
}
"#;

//  Monitors

fn list_monitors() -> Vec<gdk::Monitor> {
    let Some(display) = gdk::Display::default() else {
        warn!("no GDK display; assuming a single default monitor");
        return Vec::new();
    };
    let model = display.monitors();
    (0..model.n_items())
        .filter_map(|i| model.item(i))
        .filter_map(|item| item.downcast::<gdk::Monitor>().ok())
        .collect()
}

fn monitor_rect(monitor: &gdk::Monitor) -> Rect {
    let g = monitor.geometry();
    Rect::new(g.x() as f64, g.y() as f64, g.width() as f64, g.height() as f64)
}

//  Painting

fn rounded_rect(ctx: &Context, r: Rect, radius: f64) {
    let radius = radius.min(r.width / 2.0).min(r.height / 2.0).max(0.0);
    ctx.new_sub_path();
    ctx.arc(r.right() - radius, r.y + radius, radius, -FRAC_PI_2, 0.0);
    ctx.arc(r.right() - radius, r.bottom() - radius, radius, 0.0, FRAC_PI_2);
    ctx.arc(r.x + radius, r.bottom() - radius, radius, FRAC_PI_2, PI);
    ctx.arc(r.x + radius, r.y + radius, radius, PI, PI + FRAC_PI_2);
    ctx.close_path();
}

fn draw_panel(ctx: &Context, layout: &PanelLayout, style: &PanelStyle) {
    let gray = style.gray as f64 / 255.0;
    rounded_rect(ctx, layout.panel, style.corner_radius);
    ctx.set_source_rgba(gray, gray, gray, style.alpha);
    if let Err(e) = ctx.fill() {
        debug!("panel fill failed: {}", e);
    }

    if layout.expanded && layout.handle.width > 0.0 {
        // Grip: a short bar centered in the handle band.
        let h = layout.handle;
        let grip = Rect::new(h.x + h.width / 2.0 - 20.0, h.y + h.height / 2.0 - 2.0, 40.0, 4.0);
        rounded_rect(ctx, grip, 2.0);
        ctx.set_source_rgba(0.0, 0.0, 0.0, 0.25);
        let _ = ctx.fill();
    }
}

//  Window plumbing

/// Mirror the placement into layer-shell margins and widget size.
fn apply_bounds(window: &gtk4::Window, canvas: &gtk4::DrawingArea, placement: &HostWindow) {
    let b = placement.bounds();
    let d = placement.display();
    window.set_margin(Edge::Left, b.x - d.x as i32);
    window.set_margin(Edge::Top, b.y - d.y as i32);
    canvas.set_content_width(b.width as i32);
    canvas.set_content_height(b.height as i32);
    window.set_default_size(b.width as i32, b.height as i32);
}

/// Input region in window coordinates as `(x, y, width, height)`.
fn input_rect(placement: &HostWindow, layout: &PanelLayout) -> (i32, i32, i32, i32) {
    if placement.ignores_mouse() {
        let r = layout.hit_area();
        (
            r.x.floor() as i32,
            r.y.floor() as i32,
            r.width.ceil() as i32,
            r.height.ceil() as i32,
        )
    } else {
        let b = placement.bounds();
        (0, 0, b.width as i32, b.height as i32)
    }
}

fn load_css(css_path: &Option<PathBuf>) {
    let provider = gtk4::CssProvider::new();

    let css_content = match css_path.as_ref().filter(|p| p.exists()) {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(content) => {
                info!("user CSS: {} ({} bytes)", p.display(), content.len());
                content
            }
            Err(e) => {
                warn!("CSS read failed ({}): {}; using built-in", p.display(), e);
                DEFAULT_CSS.to_string()
            }
        },
        None => DEFAULT_CSS.to_string(),
    };

    #[allow(deprecated)]
    provider.load_from_data(&css_content);

    if let Some(display) = gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    } else {
        warn!("no GDK display; CSS will not be applied");
    }
}

//  Input controllers

/// Everything a controller callback needs to turn window-local coordinates
/// into engine events.
#[derive(Clone)]
struct Dispatch {
    engine: Rc<RefCell<Engine>>,
    placement: Rc<RefCell<HostWindow>>,
}

impl Dispatch {
    fn screen(&self, x: f64, y: f64) -> Point {
        let b = self.placement.borrow().bounds();
        Point::new(x + b.x as f64, y + b.y as f64)
    }

    fn send(&self, event: InputEvent) {
        self.engine.borrow_mut().handle(event, Instant::now());
    }

    fn pointer_down(&self, x: f64, y: f64) {
        let target = self.engine.borrow().layout().target_at(Point::new(x, y));
        let p = self.screen(x, y);
        self.send(InputEvent::PointerDown {
            x: p.x,
            y: p.y,
            target,
        });
    }

    fn pointer_move(&self, x: f64, y: f64) {
        let p = self.screen(x, y);
        self.send(InputEvent::PointerMove {
            x: p.x,
            y: p.y,
            local: Some(Point::new(x, y)),
        });
    }

    fn pointer_up(&self, x: f64, y: f64) {
        let p = self.screen(x, y);
        self.send(InputEvent::PointerUp {
            x: Some(p.x),
            y: Some(p.y),
        });
    }
}

fn attach_controllers(window: &gtk4::Window, canvas: &gtk4::DrawingArea, dispatch: &Dispatch) {
    let click = gtk4::GestureClick::new();
    click.set_button(0);
    {
        let d = dispatch.clone();
        click.connect_pressed(move |_, _, x, y| d.pointer_down(x, y));
    }
    {
        let d = dispatch.clone();
        click.connect_released(move |_, _, x, y| d.pointer_up(x, y));
    }
    canvas.add_controller(click);

    let motion = gtk4::EventControllerMotion::new();
    {
        let d = dispatch.clone();
        motion.connect_motion(move |_, x, y| d.pointer_move(x, y));
    }
    {
        let d = dispatch.clone();
        motion.connect_leave(move |_| d.send(InputEvent::PointerLeave));
    }
    canvas.add_controller(motion);

    {
        let d = dispatch.clone();
        window.connect_is_active_notify(move |w| {
            if !w.is_active() {
                d.send(InputEvent::FocusLost);
            }
        });
    }

    let drop = gtk4::DropTarget::new(gdk::FileList::static_type(), gdk::DragAction::COPY);
    {
        let d = dispatch.clone();
        drop.connect_enter(move |_, _, _| {
            d.send(InputEvent::DragEnter { has_data: true });
            gdk::DragAction::COPY
        });
    }
    {
        let d = dispatch.clone();
        drop.connect_motion(move |_, _, _| {
            d.send(InputEvent::DragOver);
            gdk::DragAction::COPY
        });
    }
    {
        let d = dispatch.clone();
        drop.connect_leave(move |_| d.send(InputEvent::DragLeave));
    }
    {
        let d = dispatch.clone();
        drop.connect_drop(move |_, value, _, _| {
            match value.get::<gdk::FileList>() {
                Ok(list) => {
                    for file in list.files() {
                        info!("dropped {:?}", file.path());
                    }
                }
                Err(e) => warn!("unexpected drop payload: {}", e),
            }
            d.send(InputEvent::Drop);
            true
        });
    }
    canvas.add_controller(drop);
}

//  Public API

/// Run the GTK4 main loop on the **current** (main) thread.
///
/// `input_rx` carries events from background sources (the Unix socket);
/// pointer, focus and drag input from the window itself is handled
/// directly.  Returns when every background source has hung up.
pub fn run_main_loop(
    store: JsonConfigStore,
    input_rx: mpsc::Receiver<TimedEvent>,
    css_path: Option<PathBuf>,
) {
    if let Err(e) = gtk4::init() {
        error!("failed to initialise GTK4: {}", e);
        return;
    }
    info!("GTK4 initialised on main thread");

    load_css(&css_path);

    let monitors = list_monitors();
    store.set_displays(monitors.iter().map(monitor_rect).collect());
    info!("found {} monitor(s)", monitors.len());

    let (host, host_rx) = ChannelHost::pair();
    let mut engine = InteractionEngine::new(host, store);
    let drop_zone_rx = engine.subscribe_drop_zone();

    let settings = engine.settings().clone();
    let placement = HostWindow::new(
        settings.display,
        settings.anchor_offset,
        settings.metrics.collapsed_height,
    );

    //  Layer-shell overlay window
    let window = gtk4::Window::new();
    window.init_layer_shell();
    window.set_layer(Layer::Overlay);
    window.set_namespace("edgebar");
    window.set_keyboard_mode(KeyboardMode::OnDemand);
    window.set_anchor(Edge::Top, true);
    window.set_anchor(Edge::Left, true);
    window.set_exclusive_zone(-1);
    window.set_decorated(false);
    window.remove_css_class("background");

    let mut monitor_index = settings.display_index;
    if let Some(m) = monitors.get(monitor_index).or_else(|| monitors.first()) {
        window.set_monitor(m);
    }

    let overlay = gtk4::Overlay::new();
    let canvas = gtk4::DrawingArea::new();
    overlay.set_child(Some(&canvas));

    let drop_label = gtk4::Label::new(Some("Drop to add"));
    drop_label.add_css_class("drop-zone");
    drop_label.set_halign(gtk4::Align::Center);
    drop_label.set_valign(gtk4::Align::Center);
    drop_label.set_can_target(false);
    drop_label.set_visible(false);
    overlay.add_overlay(&drop_label);
    window.set_child(Some(&overlay));

    let engine = Rc::new(RefCell::new(engine));
    let placement = Rc::new(RefCell::new(placement));

    {
        let engine = engine.clone();
        canvas.set_draw_func(move |_, ctx, _, _| {
            let e = engine.borrow();
            draw_panel(ctx, &e.layout(), &e.style());
        });
    }

    let dispatch = Dispatch {
        engine: engine.clone(),
        placement: placement.clone(),
    };
    attach_controllers(&window, &canvas, &dispatch);

    engine.borrow_mut().start(Instant::now());
    for request in host_rx.try_iter() {
        placement.borrow_mut().apply(request);
    }
    apply_bounds(&window, &canvas, &placement.borrow());
    window.present();
    info!("overlay mapped: {:?}", placement.borrow().bounds());

    let mut last_region: Option<(i32, i32, i32, i32)> = None;

    //  Main event loop (~60 fps)
    glib::timeout_add_local(FRAME_INTERVAL, move || {
        let now = Instant::now();

        // 1. Drain background input.
        let mut disconnected = false;
        loop {
            match input_rx.try_recv() {
                Ok(timed) => engine.borrow_mut().handle(timed.event, timed.at),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        // 2. Advance the engine.
        engine.borrow_mut().on_frame(now);

        // 3. Follow display changes from the configuration.
        // Borrows are released before touching GTK, which may re-enter the
        // controllers synchronously.
        let (display, anchor_offset, display_index) = {
            let e = engine.borrow();
            let s = e.settings();
            (s.display, s.anchor_offset, s.display_index)
        };
        if placement.borrow().display() != display {
            info!("moving to display {:?}", display);
            placement.borrow_mut().set_display(display, anchor_offset);
        }
        if display_index != monitor_index {
            monitor_index = display_index;
            if let Some(m) = monitors.get(monitor_index).or_else(|| monitors.first()) {
                window.set_monitor(m);
            }
        }

        // 4. Apply host requests.
        let mut moved = false;
        let mut layer = None;
        for request in host_rx.try_iter() {
            match &request {
                HostRequest::KeepOnTop(on) => {
                    layer = Some(if *on { Layer::Overlay } else { Layer::Top });
                }
                HostRequest::Resize { .. } | HostRequest::MoveBy { .. } => moved = true,
                _ => {}
            }
            placement.borrow_mut().apply(request);
        }
        if let Some(layer) = layer {
            window.set_layer(layer);
        }
        if moved {
            let p = placement.borrow().clone();
            apply_bounds(&window, &canvas, &p);
        }

        // 5. Click-through region.
        let rect = {
            let layout = engine.borrow().layout();
            input_rect(&placement.borrow(), &layout)
        };
        if last_region != Some(rect) {
            if let Some(surface) = window.surface() {
                let (x, y, w, h) = rect;
                surface.set_input_region(&Region::create_rectangle(&RectangleInt::new(x, y, w, h)));
                last_region = Some(rect);
            }
        }

        // 6. Drop zone hint.
        while let Ok(visible) = drop_zone_rx.try_recv() {
            drop_label.set_visible(visible);
        }

        canvas.queue_draw();

        if disconnected {
            info!("all sources closed, exiting");
            return glib::ControlFlow::Break;
        }
        glib::ControlFlow::Continue
    });

    info!("entering GLib main loop");
    let main_loop = glib::MainLoop::new(None, false);
    main_loop.run();
    info!("GLib main loop exited");
}

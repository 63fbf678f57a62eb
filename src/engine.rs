//! The interaction engine: gesture input in, geometry requests out.
//!
//! [`InteractionEngine`] owns the panel state and every in-flight
//! interaction (a horizontal [`GestureSession`], a vertical
//! [`RepositionDrag`], or an [`Animation`]).  It is driven from a single
//! thread by two entry points:
//!
//! * [`handle`](InteractionEngine::handle) for each [`InputEvent`], and
//! * [`on_frame`](InteractionEngine::on_frame) once per display refresh,
//!   which advances the animation, releases throttled geometry, resolves
//!   pending anchor queries and absorbs configuration changes.
//!
//! Cancelling an animation is just clearing an `Option`, so it is
//! synchronous: no stale frame can land after a gesture takes over.

use crate::animator::{Animation, Transition};
use crate::config::{Config, ConfigChange, Settings};
use crate::drop_target::DropTargetVisibility;
use crate::event::{InputEvent, PointerTarget};
use crate::geometry::{window_target, GeometryTarget, Point};
use crate::gesture::{GestureSession, Release, StartState};
use crate::hit_test::{IgnoreMouse, TransparencyGate};
use crate::panel::{PanelLayout, PanelState, PanelStyle};
use crate::reposition::RepositionDrag;
use crate::sync::GeometrySync;
use crate::traits::{AnchorPoll, AnchorReply, ConfigStore, GeometryHost};
use log::{debug, error, info, warn};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Delay between an external drag leaving the window and the panel
/// collapsing.  Re-entering within this window keeps the panel open.
pub const DRAG_LEAVE_COLLAPSE_DELAY: Duration = Duration::from_millis(150);

pub struct InteractionEngine<H: GeometryHost, S: ConfigStore> {
    host: H,
    store: S,
    settings: Settings,
    /// Structural settings waiting for the panel to go idle.
    pending_settings: Option<Settings>,
    config_rx: mpsc::Receiver<Config>,

    panel: PanelState,
    session: Option<GestureSession>,
    reposition: Option<RepositionDrag>,
    animation: Option<Animation>,

    sync: GeometrySync,
    gate: TransparencyGate,
    drop_zone: DropTargetVisibility,
    pending_anchor: Option<AnchorReply>,
    drag_leave_deadline: Option<Instant>,
}

impl<H: GeometryHost, S: ConfigStore> InteractionEngine<H, S> {
    /// Create an engine, reading the initial configuration from `store`.
    pub fn new(host: H, store: S) -> Self {
        let config = match store.load() {
            Ok(cfg) => cfg,
            Err(e) => {
                info!("config unavailable ({}), using defaults", e);
                store.fallback()
            }
        };
        let config_rx = store.subscribe();
        Self {
            host,
            store,
            settings: Settings::from_config(&config),
            pending_settings: None,
            config_rx,
            panel: PanelState::default(),
            session: None,
            reposition: None,
            animation: None,
            sync: GeometrySync::default(),
            gate: TransparencyGate::new(),
            drop_zone: DropTargetVisibility::new(),
            pending_anchor: None,
            drag_leave_deadline: None,
        }
    }

    /// Put the window in its initial state: on top, click-through outside
    /// the strip, sized as a collapsed strip.
    pub fn start(&mut self, now: Instant) {
        info!(
            "engine start: display {:?}, anchor offset {}",
            self.settings.display, self.settings.anchor_offset
        );
        if self.settings.always_on_top {
            self.host.keep_on_top(true);
        }
        let release = self.gate.release();
        self.emit_ignore(release);
        self.force_sync(now);
    }

    //  Accessors

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn progress(&self) -> f64 {
        self.panel.progress()
    }

    pub fn is_expanded(&self) -> bool {
        self.panel.is_expanded()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Direction of the running animation, if any.
    pub fn animation_transition(&self) -> Option<Transition> {
        self.animation.as_ref().map(Animation::transition)
    }

    pub fn is_gesture_active(&self) -> bool {
        self.session.is_some() || self.reposition.is_some()
    }

    /// No gesture, no drag, no animation.
    pub fn is_idle(&self) -> bool {
        !self.is_gesture_active() && self.animation.is_none()
    }

    pub fn style(&self) -> PanelStyle {
        PanelStyle::at(
            self.panel.progress(),
            self.settings.opacity,
            self.is_idle(),
        )
    }

    pub fn layout(&self) -> PanelLayout {
        PanelLayout::compute(
            &self.settings.metrics,
            &self.panel,
            &self.style(),
            self.displayed_target(),
        )
    }

    /// Show/hide notifications for the drag-to-launch drop zone.
    pub fn subscribe_drop_zone(&mut self) -> mpsc::Receiver<bool> {
        self.drop_zone.subscribe()
    }

    pub fn is_drop_zone_visible(&self) -> bool {
        self.drop_zone.is_visible()
    }

    //  Input

    pub fn handle(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::PointerDown { x, y, target } => self.pointer_down(x, y, target, now),
            InputEvent::PointerMove { x, y, local } => self.pointer_move(x, y, local, now),
            InputEvent::PointerUp { x, .. } => self.pointer_up(x, now),
            InputEvent::PointerLeave => {
                if !self.is_gesture_active() {
                    let release = self.gate.release();
                    self.emit_ignore(release);
                }
            }
            InputEvent::FocusLost => {
                if self.session.take().is_some() {
                    debug!("focus lost: gesture dropped");
                }
                if self.reposition.take().is_some() {
                    self.finish_reposition();
                }
                self.animate_to(Transition::Collapse, now);
            }
            InputEvent::DragEnter { has_data } => {
                self.drop_zone.enter();
                self.drag_leave_deadline = None;
                let capture = self.gate.capture();
                self.emit_ignore(capture);
                if has_data && !self.panel.is_expanded() && self.is_idle() {
                    debug!("external drag: expanding");
                    self.animate_to(Transition::Expand, now);
                }
            }
            InputEvent::DragOver => {
                self.drag_leave_deadline = None;
                let capture = self.gate.capture();
                self.emit_ignore(capture);
            }
            InputEvent::DragLeave => {
                self.drop_zone.leave();
                self.drag_leave_deadline = Some(now + DRAG_LEAVE_COLLAPSE_DELAY);
            }
            InputEvent::Drop => {
                self.drop_zone.reset();
                self.drag_leave_deadline = None;
                self.animate_to(Transition::Collapse, now);
            }
            InputEvent::Expand => self.animate_to(Transition::Expand, now),
            InputEvent::Collapse => self.animate_to(Transition::Collapse, now),
            InputEvent::Toggle => {
                if self.heading_to_expanded() {
                    self.animate_to(Transition::Collapse, now);
                } else {
                    self.animate_to(Transition::Expand, now);
                }
            }
            InputEvent::ReloadConfig => match self.store.load() {
                Ok(cfg) => self.apply_config(cfg, now),
                Err(e) => warn!("config reload failed, keeping current settings: {}", e),
            },
        }
    }

    fn pointer_down(&mut self, x: f64, y: f64, target: PointerTarget, now: Instant) {
        match target {
            PointerTarget::Interactive if self.panel.is_expanded() => {
                // The control handles its own press.
            }
            PointerTarget::Outside => {
                if self.heading_to_expanded() && !self.is_gesture_active() {
                    debug!("pointer down outside the panel: collapsing");
                    self.animate_to(Transition::Collapse, now);
                }
            }
            PointerTarget::Handle => {
                if self.session.is_some() {
                    return;
                }
                self.reposition = Some(RepositionDrag::begin(y));
                let capture = self.gate.capture();
                self.emit_ignore(capture);
            }
            PointerTarget::Panel | PointerTarget::Interactive => {
                if self.reposition.is_some() {
                    return;
                }
                let start = match self.animation.take() {
                    Some(_) => StartState::Animating(self.panel.progress()),
                    None if self.panel.is_expanded() => StartState::Expanded,
                    None => StartState::Collapsed,
                };
                self.session = Some(GestureSession::begin(x, now, start, self.settings.gestures));
                let capture = self.gate.capture();
                self.emit_ignore(capture);
            }
        }
    }

    fn pointer_move(&mut self, x: f64, y: f64, local: Option<Point>, now: Instant) {
        if let Some(drag) = self.reposition.as_mut() {
            if let Some(dy) = drag.step(y) {
                self.host.move_window_by(dy);
            }
            return;
        }

        if let Some(session) = self.session.as_mut() {
            if let Some(progress) = session.track(x, now) {
                self.panel.set_progress(progress);
                self.offer_sync(now);
            }
            return;
        }

        if self.animation.is_some() {
            return;
        }

        let local = local.unwrap_or_else(|| {
            let top = self.displayed_target().y as f64;
            Point::new(x - self.settings.display.x, y - top)
        });
        let layout = self.layout();
        let change = self.gate.hover(&layout, local);
        self.emit_ignore(change);
    }

    fn pointer_up(&mut self, x: Option<f64>, now: Instant) {
        if self.reposition.take().is_some() {
            self.finish_reposition();
            return;
        }
        let Some(session) = self.session.take() else {
            return;
        };
        match session.finish(x, now, self.panel.is_expanded()) {
            Release::Expand => self.animate_to(Transition::Expand, now),
            Release::Collapse => self.animate_to(Transition::Collapse, now),
            Release::Discard => {}
        }
    }

    fn finish_reposition(&mut self) {
        debug!("reposition end: querying anchor offset");
        self.pending_anchor = Some(self.host.query_anchor_offset());
    }

    //  Animation

    pub fn expand(&mut self, now: Instant) {
        self.animate_to(Transition::Expand, now);
    }

    pub fn collapse(&mut self, now: Instant) {
        self.animate_to(Transition::Collapse, now);
    }

    /// Start animating toward `transition`'s resting state.
    ///
    /// Supersedes any running animation and ends any horizontal gesture.
    /// The new animation starts from the current progress, so an interrupted
    /// transition never jumps.
    pub fn animate_to(&mut self, transition: Transition, now: Instant) {
        let target = transition.target();
        if self.session.is_none() && self.animation.is_none() && self.panel.rests_at(target) {
            return;
        }
        self.session = None;

        if self.panel.progress() == target {
            self.animation = None;
            self.settle(transition, now);
            return;
        }

        self.animation = Some(Animation::new(
            transition,
            self.panel.progress(),
            now,
            self.settings.animation_duration(),
            self.settings.animation.easing,
        ));
        let capture = self.gate.capture();
        self.emit_ignore(capture);
    }

    fn settle(&mut self, transition: Transition, now: Instant) {
        self.panel.set_progress(transition.target());
        self.panel.commit(transition.is_expand());
        debug!("settled {:?}", transition);
        self.force_sync(now);
    }

    fn heading_to_expanded(&self) -> bool {
        match &self.animation {
            Some(a) => a.transition().is_expand(),
            None => self.panel.is_expanded(),
        }
    }

    //  Frame tick

    /// Advance everything time-driven.  Call once per display refresh.
    pub fn on_frame(&mut self, now: Instant) {
        while let Ok(config) = self.config_rx.try_recv() {
            self.apply_config(config, now);
        }

        if let Some(deadline) = self.drag_leave_deadline {
            if now >= deadline {
                self.drag_leave_deadline = None;
                debug!("external drag left: collapsing");
                self.animate_to(Transition::Collapse, now);
            }
        }

        self.poll_anchor(now);

        if let Some(animation) = &self.animation {
            let transition = animation.transition();
            let frame = animation.sample(now);
            if frame.finished {
                self.animation = None;
                self.settle(transition, now);
            } else {
                self.panel.set_progress(frame.progress);
                self.offer_sync(now);
            }
        }

        if let Some(target) = self.sync.flush(now) {
            self.send_resize(target);
        }

        if self.is_idle() {
            if let Some(next) = self.pending_settings.take() {
                info!("applying deferred configuration");
                self.settings = next;
                self.force_sync(now);
            }
        }
    }

    fn poll_anchor(&mut self, now: Instant) {
        let Some(reply) = &self.pending_anchor else {
            return;
        };
        match reply.poll() {
            AnchorPoll::Pending => {}
            AnchorPoll::Lost => {
                warn!("anchor offset query went unanswered, keeping {}", self.settings.anchor_offset);
                self.pending_anchor = None;
            }
            AnchorPoll::Ready(offset) => {
                self.pending_anchor = None;
                info!("new anchor offset {}", offset);
                self.settings.anchor_offset = offset as f64;
                if let Some(pending) = self.pending_settings.as_mut() {
                    pending.anchor_offset = offset as f64;
                }
                if let Err(e) = self.store.save_anchor_offset(offset) {
                    error!("failed to save anchor offset: {}", e);
                }
                if self.is_idle() {
                    self.force_sync(now);
                }
            }
        }
    }

    //  Configuration

    /// Take a new configuration.  Cosmetic changes apply at once;
    /// structural ones wait until nothing is moving.
    pub fn apply_config(&mut self, config: Config, now: Instant) {
        let next = Settings::from_config(&config);
        match self.settings.diff(&next) {
            ConfigChange::Unchanged => {}
            ConfigChange::Cosmetic => {
                debug!("cosmetic configuration change");
                if next.always_on_top != self.settings.always_on_top {
                    self.host.keep_on_top(next.always_on_top);
                }
                self.settings = next;
                self.pending_settings = None;
            }
            ConfigChange::Structural => {
                if next.always_on_top != self.settings.always_on_top {
                    self.host.keep_on_top(next.always_on_top);
                    self.settings.always_on_top = next.always_on_top;
                }
                if self.is_idle() {
                    info!("configuration changed, resyncing window");
                    self.settings = next;
                    self.pending_settings = None;
                    self.force_sync(now);
                } else {
                    debug!("structural configuration change deferred");
                    self.pending_settings = Some(next);
                }
            }
        }
    }

    //  Geometry

    fn current_target(&self) -> GeometryTarget {
        window_target(
            &self.settings.metrics,
            self.settings.display,
            self.settings.anchor_offset,
            self.panel.progress(),
        )
    }

    /// What the host is showing, as far as we know.
    fn displayed_target(&self) -> GeometryTarget {
        self.sync.last_sent().unwrap_or_else(|| self.current_target())
    }

    fn offer_sync(&mut self, now: Instant) {
        let target = self.current_target();
        if let Some(t) = self.sync.offer(self.panel.progress(), target, now) {
            self.send_resize(t);
        }
    }

    fn force_sync(&mut self, now: Instant) {
        let target = self.current_target();
        let t = self.sync.force(target, now);
        self.send_resize(t);
    }

    fn send_resize(&self, t: GeometryTarget) {
        self.host.resize(t.width, t.height, Some(t.y));
    }

    fn emit_ignore(&self, change: Option<IgnoreMouse>) {
        if let Some(IgnoreMouse { ignore, forward }) = change {
            self.host.set_ignore_mouse(ignore, forward);
        }
    }
}

//  Tests

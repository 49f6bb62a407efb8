use super::artwork::Posters;
use super::view::{self, Frame};
use crate::gui::theme::ThemeColors;
use cairo::Context;
use gtk::glib;
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use wheelkit::geometry::{Point, WheelGeometry};
use wheelkit::hit::{Hit, hit_test};
use wheelkit::item::{ItemId, WheelItem};
use wheelkit::poster::ReadyCallback;
use wheelkit::redraw::{FrameSource, RedrawCoalescer};
use wheelkit::settings::SpinSettings;
use wheelkit::spin::{SpinAnimator, SpinError, SpinOutcome, SpinPlan, SpinTick};

#[derive(Default)]
struct CanvasState {
    animator: RefCell<SpinAnimator>,
    hovered: RefCell<Option<String>>,
    size: Cell<(i32, i32)>,
    resize_pending: Cell<bool>,
    tick: RefCell<Option<gtk::TickCallbackId>>,
    done: RefCell<Option<async_channel::Sender<SpinOutcome>>>,
}

impl CanvasState {
    fn finish(&self, outcome: SpinOutcome) {
        if let Some(tx) = self.done.borrow_mut().take() {
            let _ = tx.try_send(outcome);
        }
    }
}

/// Resolves once the spin it was returned for settles or is cancelled.
pub struct SpinCompletion(async_channel::Receiver<SpinOutcome>);

impl SpinCompletion {
    pub async fn wait(self) -> SpinOutcome {
        self.0.recv().await.unwrap_or(SpinOutcome::Cancelled)
    }
}

/// The wheel's drawing area plus the state that is not part of the store:
/// current rotation, the spin in flight and the hovered entry.
#[derive(Clone)]
pub struct WheelCanvas {
    area: gtk::DrawingArea,
    state: Rc<CanvasState>,
}

impl WheelCanvas {
    pub fn new(area: gtk::DrawingArea) -> Self {
        Self {
            area,
            state: Rc::new(CanvasState::default()),
        }
    }

    pub fn rotation(&self) -> f64 {
        self.state.animator.borrow().rotation()
    }

    pub fn is_spinning(&self) -> bool {
        self.state.animator.borrow().is_spinning()
    }

    pub fn geometry(&self) -> Option<WheelGeometry> {
        WheelGeometry::from_size(self.area.width() as f64, self.area.height() as f64)
    }

    pub fn outer_radius(&self) -> Option<f64> {
        self.geometry().map(|g| g.radius)
    }

    /// Spin until a segment of `winner` sits under the pointer, driven by the
    /// widget's frame clock.
    pub fn spin(
        &self,
        items: &[WheelItem],
        winner: &ItemId,
        settings: &SpinSettings,
    ) -> Result<SpinCompletion, SpinError> {
        let plan = SpinPlan::new(items, winner, self.rotation(), settings, &mut rand::rng());
        log::debug!(
            "Spinning {:.2} -> {:.2} rad over {:?} (segment {:?})",
            plan.from,
            plan.to,
            plan.duration,
            plan.target.segment
        );
        self.state.animator.borrow_mut().start(plan)?;
        self.state.hovered.borrow_mut().take();

        let (tx, rx) = async_channel::bounded(1);
        *self.state.done.borrow_mut() = Some(tx);

        let state = self.state.clone();
        let id = self.area.add_tick_callback(move |area, clock| {
            let now = Duration::from_micros(clock.frame_time().max(0) as u64);
            let tick = state.animator.borrow_mut().tick(now);
            area.queue_draw();
            match tick {
                SpinTick::Frame(_) => glib::ControlFlow::Continue,
                SpinTick::Settled(_) => {
                    state.tick.borrow_mut().take();
                    state.finish(SpinOutcome::Finished);
                    glib::ControlFlow::Break
                }
                SpinTick::Idle => glib::ControlFlow::Break,
            }
        });
        *self.state.tick.borrow_mut() = Some(id);

        Ok(SpinCompletion(rx))
    }

    /// Stop the wheel where it is. Returns whether a spin was running.
    pub fn cancel(&self) -> bool {
        if !self.state.animator.borrow_mut().cancel() {
            return false;
        }
        if let Some(id) = self.state.tick.borrow_mut().take() {
            id.remove();
        }
        self.state.finish(SpinOutcome::Cancelled);
        self.area.queue_draw();
        true
    }

    /// Returns whether the hovered entry changed.
    pub fn set_hovered(&self, key: Option<String>) -> bool {
        let mut hovered = self.state.hovered.borrow_mut();
        if *hovered == key {
            return false;
        }
        *hovered = key;
        true
    }

    /// Nothing is hit while the wheel moves.
    pub fn hit<'a>(&self, items: &'a [WheelItem], point: Point) -> Option<Hit<'a>> {
        if self.is_spinning() {
            return None;
        }
        hit_test(&self.geometry()?, self.rotation(), items, point)
    }

    pub fn in_hub(&self, point: Point) -> bool {
        self.geometry()
            .is_some_and(|g| g.polar(point).0 <= g.hub_radius())
    }

    /// Returns whether the size differs from the last one seen.
    pub fn note_size(&self, width: i32, height: i32) -> bool {
        self.state.size.replace((width, height)) != (width, height)
    }

    pub fn defer_resize(&self) {
        self.state.resize_pending.set(true);
    }

    pub fn take_deferred_resize(&self) -> bool {
        self.state.resize_pending.replace(false)
    }

    pub fn draw(
        &self,
        cr: &Context,
        width: i32,
        height: i32,
        items: &[WheelItem],
        posters: &Posters,
        colors: &ThemeColors,
        on_ready: &dyn Fn() -> ReadyCallback,
    ) -> Result<(), cairo::Error> {
        let hovered = self.state.hovered.borrow();
        let frame = Frame {
            rotation: self.rotation(),
            spinning: self.is_spinning(),
            hovered: hovered.as_deref(),
            on_ready,
        };
        view::draw(
            cr,
            width as f64,
            height as f64,
            items,
            posters,
            colors,
            &frame,
        )
    }
}

struct TickFrames(gtk::DrawingArea);

impl FrameSource for TickFrames {
    fn on_next_frame(&self, callback: Box<dyn FnOnce()>) {
        let callback = Cell::new(Some(callback));
        let _ = self.0.add_tick_callback(move |_, _| {
            if let Some(cb) = callback.take() {
                cb();
            }
            glib::ControlFlow::Break
        });
    }
}

/// Shared redraw trigger for store changes and poster arrivals; requests made
/// before the next frame collapse into one `queue_draw`.
#[derive(Clone)]
pub struct RedrawHandle(Rc<RedrawCoalescer<TickFrames>>);

impl RedrawHandle {
    pub fn new(area: &gtk::DrawingArea) -> Self {
        let target = area.clone();
        Self(Rc::new(RedrawCoalescer::new(
            TickFrames(area.clone()),
            move || target.queue_draw(),
        )))
    }

    pub fn request(&self) {
        self.0.request();
    }
}

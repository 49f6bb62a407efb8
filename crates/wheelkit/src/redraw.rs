use std::cell::Cell;
use std::rc::Rc;

/// Something that can run a callback once before the next frame is painted.
pub trait FrameSource {
    fn on_next_frame(&self, callback: Box<dyn FnOnce()>);
}

/// Collapses any number of redraw requests made within one frame into a single
/// scheduled redraw.
pub struct RedrawCoalescer<F> {
    frames: F,
    scheduled: Rc<Cell<bool>>,
    redraw: Rc<dyn Fn()>,
}

impl<F: FrameSource> RedrawCoalescer<F> {
    pub fn new(frames: F, redraw: impl Fn() + 'static) -> Self {
        Self {
            frames,
            scheduled: Rc::new(Cell::new(false)),
            redraw: Rc::new(redraw),
        }
    }

    /// Returns `false` when a redraw was already pending.
    pub fn request(&self) -> bool {
        if self.scheduled.replace(true) {
            return false;
        }
        let scheduled = self.scheduled.clone();
        let redraw = self.redraw.clone();
        self.frames.on_next_frame(Box::new(move || {
            scheduled.set(false);
            redraw();
        }));
        true
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default, Clone)]
    struct ManualFrames(Rc<RefCell<Vec<Box<dyn FnOnce()>>>>);

    impl ManualFrames {
        fn run_frame(&self) {
            let pending: Vec<_> = self.0.borrow_mut().drain(..).collect();
            for cb in pending {
                cb();
            }
        }
    }

    impl FrameSource for ManualFrames {
        fn on_next_frame(&self, callback: Box<dyn FnOnce()>) {
            self.0.borrow_mut().push(callback);
        }
    }

    #[test]
    fn test_requests_in_one_frame_coalesce() {
        let frames = ManualFrames::default();
        let draws = Rc::new(Cell::new(0));
        let d = draws.clone();
        let coalescer = RedrawCoalescer::new(frames.clone(), move || d.set(d.get() + 1));

        assert!(coalescer.request());
        assert!(!coalescer.request());
        assert!(!coalescer.request());
        assert_eq!(frames.0.borrow().len(), 1);

        frames.run_frame();
        assert_eq!(draws.get(), 1);
        assert!(!coalescer.is_scheduled());

        assert!(coalescer.request());
        frames.run_frame();
        assert_eq!(draws.get(), 2);
    }
}

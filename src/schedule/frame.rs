use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Returned by a frame step to request (or decline) the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Timing information handed to every step of one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameClock {
    /// Frame counter since the host started pumping
    pub index: u64,
    /// Wall-clock (or simulated) time since the host started pumping
    pub elapsed: Duration,
}

impl FrameClock {
    pub fn new(index: u64, elapsed: Duration) -> Self {
        Self { index, elapsed }
    }

    /// Clock for frame `index` of a fixed-rate render.
    pub fn at_rate(index: u64, fps: u32) -> Self {
        let fps = fps.max(1) as f64;
        Self::new(index, Duration::from_secs_f64(index as f64 / fps))
    }

    pub fn seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

type Step<'a> = Box<dyn FnMut(&FrameClock) -> Flow + 'a>;

struct Slot<'a> {
    step: Step<'a>,
    cancelled: Rc<Cell<bool>>,
}

/// Host-pumped replacement for a display's animation-frame callback.
///
/// Steps are self-rescheduling: each pump runs every live step once, and a
/// step stays registered for as long as it returns [`Flow::Continue`] and its
/// [`LoopHandle`] is alive.
pub struct FrameLoop<'a> {
    slots: RefCell<Vec<Slot<'a>>>,
    /// Steps taken out of `slots` by the pump currently running
    running: Cell<usize>,
}

impl<'a> Default for FrameLoop<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> FrameLoop<'a> {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            running: Cell::new(0),
        }
    }

    /// Register a step for the next frame. Dropping the handle cancels it.
    #[must_use = "dropping the handle cancels the loop immediately"]
    pub fn start<F>(&self, tick: F) -> LoopHandle
    where
        F: FnMut(&FrameClock) -> Flow + 'a,
    {
        let cancelled = Rc::new(Cell::new(false));
        self.slots.borrow_mut().push(Slot {
            step: Box::new(tick),
            cancelled: Rc::clone(&cancelled),
        });
        LoopHandle { cancelled }
    }

    /// Run one frame. Returns how many steps ran.
    ///
    /// Steps may call back into the loop. Anything they `start` is queued
    /// for the next frame.
    pub fn pump(&self, clock: FrameClock) -> usize {
        let mut live = std::mem::take(&mut *self.slots.borrow_mut());
        self.running.set(live.len());
        let mut ran = 0;
        live.retain_mut(|slot| {
            if slot.cancelled.get() {
                return false;
            }
            ran += 1;
            match (slot.step)(&clock) {
                Flow::Continue => true,
                Flow::Stop => {
                    slot.cancelled.set(true);
                    false
                }
            }
        });
        self.running.set(0);

        let mut slots = self.slots.borrow_mut();
        let started = std::mem::replace(&mut *slots, live);
        slots.extend(started);
        ran
    }

    /// Steps still waiting for a frame.
    pub fn pending(&self) -> usize {
        let queued = self
            .slots
            .borrow()
            .iter()
            .filter(|slot| !slot.cancelled.get())
            .count();
        queued + self.running.get()
    }

    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

/// Ownership of one registered frame step.
#[derive(Debug)]
pub struct LoopHandle {
    cancelled: Rc<Cell<bool>>,
}

impl LoopHandle {
    /// True until the step stops itself or is cancelled.
    pub fn is_active(&self) -> bool {
        !self.cancelled.get()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}

//! Cancellable per-frame task.
//!
//! The loop never calls back into user code itself; the scheduler's callback
//! calls `on_frame`, which says whether to run this frame and re-arms the
//! next request.

/// Something that can ask for a callback on the next display frame.
pub trait FrameScheduler {
    type Handle: Copy;

    /// Request one callback. `None` if the request could not be made.
    fn request(&mut self) -> Option<Self::Handle>;

    fn cancel(&mut self, handle: Self::Handle);
}

pub struct FrameLoop<S: FrameScheduler> {
    scheduler: S,
    pending: Option<S::Handle>,
    running: bool,
    frames: u64,
}

impl<S: FrameScheduler> FrameLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self { scheduler, pending: None, running: false, frames: 0 }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frames run since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Begin requesting frames. A second call while running does nothing.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.arm();
        log::debug!("frame loop started");
    }

    /// Cancel the outstanding request, if any.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
        log::debug!("frame loop stopped after {} frames", self.frames);
    }

    /// Called from the scheduler callback. Returns true when the frame should
    /// be drawn; a late callback after `stop` returns false.
    pub fn on_frame(&mut self) -> bool {
        self.pending = None;
        if !self.running {
            return false;
        }
        self.frames += 1;
        self.arm();
        true
    }

    fn arm(&mut self) {
        self.pending = self.scheduler.request();
        if self.pending.is_none() {
            log::warn!("frame request failed; loop halted");
            self.running = false;
        }
    }
}

impl<S: FrameScheduler> Drop for FrameLoop<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        next: u32,
        live: Vec<u32>,
        cancelled: Vec<u32>,
        fail: bool,
    }

    #[derive(Clone, Default)]
    struct FakeScheduler(Rc<RefCell<Log>>);

    impl FrameScheduler for FakeScheduler {
        type Handle = u32;

        fn request(&mut self) -> Option<u32> {
            let mut log = self.0.borrow_mut();
            if log.fail {
                return None;
            }
            log.next += 1;
            let handle = log.next;
            log.live.push(handle);
            Some(handle)
        }

        fn cancel(&mut self, handle: u32) {
            let mut log = self.0.borrow_mut();
            log.live.retain(|h| *h != handle);
            log.cancelled.push(handle);
        }
    }

    #[test]
    fn test_start_is_idempotent() {
        let sched = FakeScheduler::default();
        let mut lp = FrameLoop::new(sched.clone());
        lp.start();
        lp.start();
        assert!(lp.is_running());
        assert_eq!(sched.0.borrow().live, vec![1]);
    }

    #[test]
    fn test_stop_cancels_pending() {
        let sched = FakeScheduler::default();
        let mut lp = FrameLoop::new(sched.clone());
        lp.start();
        assert!(lp.on_frame());
        lp.stop();
        assert!(!lp.is_running());
        assert_eq!(sched.0.borrow().cancelled, vec![2]);
        // A callback that was already in flight does nothing.
        assert!(!lp.on_frame());
        assert_eq!(lp.frames(), 1);
    }

    #[test]
    fn test_drop_releases_request() {
        let sched = FakeScheduler::default();
        {
            let mut lp = FrameLoop::new(sched.clone());
            lp.start();
        }
        let log = sched.0.borrow();
        assert!(log.live.is_empty());
        assert_eq!(log.cancelled, vec![1]);
    }

    #[test]
    fn test_failed_request_halts() {
        let sched = FakeScheduler::default();
        sched.0.borrow_mut().fail = true;
        let mut lp = FrameLoop::new(sched.clone());
        lp.start();
        assert!(!lp.is_running());

        sched.0.borrow_mut().fail = false;
        lp.start();
        assert!(lp.is_running());
    }
}

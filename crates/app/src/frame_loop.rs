use crate::context::ApplicationContext;
use orbitview_render::{RenderError, Renderer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cloneable stop flag for a frame loop. Any clone may cancel, from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Host primitive that runs the next frame on the next display refresh.
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// A scheduler that can also block until the requested frame is due.
/// Used by hosts without a native refresh callback.
pub trait FramePacer: FrameScheduler {
    /// Wait for the pending frame. Returns `false` if no frame was requested.
    fn wait_for_frame(&mut self) -> bool;
}

/// Headless pacer that spaces frames at a fixed interval.
#[derive(Debug)]
pub struct FixedRatePacer {
    interval: Duration,
    next_deadline: Option<Instant>,
    pending: bool,
}

impl FixedRatePacer {
    pub fn new(frames_per_second: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / frames_per_second.max(1),
            next_deadline: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for FixedRatePacer {
    fn request_frame(&mut self) {
        self.pending = true;
    }
}

impl FramePacer for FixedRatePacer {
    fn wait_for_frame(&mut self) -> bool {
        if !std::mem::take(&mut self.pending) {
            return false;
        }
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        // A late frame does not cause a burst of catch-up frames.
        self.next_deadline = Some(deadline.max(now) + self.interval);
        true
    }
}

/// Explicit render loop around [`ApplicationContext::frame_tick`] with a
/// cancellation token, so a host can stop it deterministically.
#[derive(Debug, Default)]
pub struct FrameLoop {
    token: CancellationToken,
    frames: u64,
}

impl FrameLoop {
    pub fn new(token: CancellationToken) -> Self {
        Self { token, frames: 0 }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame. Returns `Ok(None)` once cancelled; a cancelled loop
    /// neither renders nor reschedules.
    pub fn tick<R, S>(
        &mut self,
        ctx: &mut ApplicationContext<R>,
        scheduler: &mut S,
    ) -> Result<Option<R::Output>, RenderError>
    where
        R: Renderer,
        S: FrameScheduler + ?Sized,
    {
        if self.token.is_cancelled() {
            return Ok(None);
        }
        let output = ctx.frame_tick(scheduler)?;
        self.frames += 1;
        Ok(Some(output))
    }

    /// Drive frames from `pacer` until the token is cancelled.
    ///
    /// Recoverable render errors are logged and the loop continues; any
    /// other error ends the loop and is returned.
    pub fn run<R, P>(
        &mut self,
        ctx: &mut ApplicationContext<R>,
        pacer: &mut P,
    ) -> Result<u64, RenderError>
    where
        R: Renderer,
        P: FramePacer + ?Sized,
    {
        tracing::debug!("frame loop started");
        pacer.request_frame();
        while !self.token.is_cancelled() && pacer.wait_for_frame() {
            match self.tick(ctx, pacer) {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("skipping frame: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(frames = self.frames, "frame loop stopped");
        Ok(self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use orbitview_common::Viewport;
    use orbitview_render::DebugTextRenderer;

    /// Pacer that never sleeps and cancels the loop after a number of requests.
    struct CancelAfter {
        token: CancellationToken,
        limit: usize,
        requests: usize,
        pending: bool,
    }

    impl FrameScheduler for CancelAfter {
        fn request_frame(&mut self) {
            self.requests += 1;
            self.pending = true;
            if self.requests >= self.limit {
                self.token.cancel();
            }
        }
    }

    impl FramePacer for CancelAfter {
        fn wait_for_frame(&mut self) -> bool {
            std::mem::take(&mut self.pending)
        }
    }

    /// Times out on odd calls, renders on even calls, runs out of memory on `fatal_at`.
    #[derive(Default)]
    struct FlakyRenderer {
        size: Viewport,
        calls: usize,
        fatal_at: usize,
    }

    impl Renderer for FlakyRenderer {
        type Output = ();

        fn set_size(&mut self, viewport: Viewport) {
            self.size = viewport;
        }

        fn size(&self) -> Viewport {
            self.size
        }

        fn render(
            &mut self,
            _: &orbitview_scene::Scene,
            _: &orbitview_render::PerspectiveCamera,
        ) -> Result<(), RenderError> {
            self.calls += 1;
            if self.calls == self.fatal_at {
                Err(RenderError::OutOfMemory)
            } else if self.calls % 2 == 1 {
                Err(RenderError::Timeout)
            } else {
                Ok(())
            }
        }
    }

    fn headless() -> ApplicationContext<DebugTextRenderer> {
        ApplicationContext::headless(Viewport::new(800, 600), &SceneConfig::default()).unwrap()
    }

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn run_stops_when_cancelled() {
        let mut ctx = headless();
        let token = CancellationToken::new();
        let mut pacer = CancelAfter {
            token: token.clone(),
            limit: 4,
            requests: 0,
            pending: false,
        };
        let mut frame_loop = FrameLoop::new(token);
        let frames = frame_loop.run(&mut ctx, &mut pacer).unwrap();

        // The initial request renders nothing; each tick requests then renders.
        assert_eq!(frames, 3);
        assert_eq!(ctx.renderer().frames_rendered(), 3);
        assert_eq!(pacer.requests, 4);
    }

    #[test]
    fn cancelled_tick_neither_renders_nor_reschedules() {
        let mut ctx = headless();
        let token = CancellationToken::new();
        let mut frame_loop = FrameLoop::new(token.clone());
        let mut pacer = FixedRatePacer::new(60);

        assert!(frame_loop.tick(&mut ctx, &mut pacer).unwrap().is_some());
        assert!(pacer.wait_for_frame());

        token.cancel();
        assert!(frame_loop.tick(&mut ctx, &mut pacer).unwrap().is_none());
        assert!(!pacer.wait_for_frame());
        assert_eq!(ctx.renderer().frames_rendered(), 1);
    }

    #[test]
    fn run_skips_timeouts_and_stops_on_fatal_error() {
        let renderer = FlakyRenderer {
            fatal_at: 6,
            ..Default::default()
        };
        let mut ctx =
            ApplicationContext::initialize(renderer, Viewport::new(800, 600), &SceneConfig::default())
                .unwrap();
        let token = CancellationToken::new();
        let mut pacer = CancelAfter {
            token: token.clone(),
            limit: 100,
            requests: 0,
            pending: false,
        };
        let mut frame_loop = FrameLoop::new(token.clone());

        let result = frame_loop.run(&mut ctx, &mut pacer);
        assert!(matches!(result, Err(RenderError::OutOfMemory)));
        // Calls 2 and 4 rendered; 1, 3 and 5 timed out.
        assert_eq!(frame_loop.frames(), 2);
        assert_eq!(ctx.renderer().calls, 6);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn pre_cancelled_loop_renders_nothing() {
        let mut ctx = headless();
        let token = CancellationToken::new();
        token.cancel();
        let mut frame_loop = FrameLoop::new(token);
        let frames = frame_loop.run(&mut ctx, &mut FixedRatePacer::new(60)).unwrap();
        assert_eq!(frames, 0);
        assert_eq!(ctx.renderer().frames_rendered(), 0);
    }

    #[test]
    fn cancel_from_another_thread() {
        let mut ctx = headless();
        let token = CancellationToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.cancel();
        });

        let mut frame_loop = FrameLoop::new(token);
        let frames = frame_loop.run(&mut ctx, &mut FixedRatePacer::new(1000)).unwrap();
        handle.join().unwrap();
        assert!(frames > 0);
        assert_eq!(frames, ctx.renderer().frames_rendered());
    }

    #[test]
    fn pacer_without_request_does_not_wait() {
        let mut pacer = FixedRatePacer::new(30);
        assert!(!pacer.wait_for_frame());
        pacer.request_frame();
        assert!(pacer.wait_for_frame());
        assert!(!pacer.wait_for_frame());
    }

    #[test]
    fn pacer_interval_from_rate() {
        assert_eq!(FixedRatePacer::new(50).interval(), Duration::from_millis(20));
        // A zero rate is treated as one frame per second.
        assert_eq!(FixedRatePacer::new(0).interval(), Duration::from_secs(1));
    }
}

use crate::input::{collect_events, map_event, Action};
use crate::term::Terminal;
use anyhow::Result;
use particle_text::{Animation, DrawMode, EffectConfig, FrameOutcome, PointerInput};
use std::time::{Duration, Instant};

pub(crate) struct App {
    term: Terminal,
    anim: Animation,
    input: PointerInput,
    paused: bool,
    show_status: bool,
    should_quit: bool,
    pacer: FramePacer,
}

impl App {
    fn init(cfg: &EffectConfig) -> Result<Self> {
        let term = Terminal::begin(cfg.width, cfg.height, cfg.background_rgb()?)?;
        let layout = term.layout();
        let mut anim = Animation::new(cfg, layout.canvas_w, layout.canvas_h)?;
        let first = anim.start();
        log::info!("formed {:?}: {first:?}", anim.current_word());

        Ok(Self {
            term,
            anim,
            input: PointerInput::default(),
            paused: false,
            show_status: true,
            should_quit: false,
            pacer: FramePacer::new(cfg.fps, Instant::now()),
        })
    }

    fn run(&mut self) -> Result<()> {
        while !self.should_quit {
            for ev in collect_events()? {
                if let Some(action) = map_event(&ev, &self.term.layout()) {
                    self.apply(action);
                }
            }

            if !self.paused {
                let outcome = self.anim.frame(self.term.canvas_mut(), &self.input);
                if outcome == FrameOutcome::Skipped {
                    log::trace!("frame skipped");
                }
            }

            let status = self.show_status.then(|| self.status_line());
            self.term.compose(status.as_deref());
            self.term.present()?;

            let wait = self.pacer.finish_frame(Instant::now());
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }
        self.term.end()
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePause => self.paused = !self.paused,
            Action::NextWord => {
                if let Some(r) = self.anim.next_word() {
                    log::debug!("manual advance: {r:?}");
                }
            }
            Action::ToggleDrawMode => self.anim.toggle_draw_mode(),
            Action::ToggleStatus => self.show_status = !self.show_status,
            Action::PointerMove(x, y) => self.input.on_move(x, y),
            Action::PointerLeave => self.input.on_leave(),
            Action::Resize(cols, rows) => {
                if let Some((w, h)) = self.term.resize(cols, rows) {
                    self.anim.resize(w, h);
                }
            }
        }
    }

    fn status_line(&self) -> String {
        let field = self.anim.field();
        let mode = match self.anim.draw_mode() {
            DrawMode::Points => "points",
            DrawMode::Circles => "circles",
        };
        format!(
            "{}{} | particles {} ({} escaping) | {} | {:.0} fps | q quit  space pause  n next  m mode  h hide",
            self.anim.current_word(),
            if self.paused { " [paused]" } else { "" },
            field.live_count(),
            field.escaping_count(),
            mode,
            self.pacer.fps(),
        )
    }
}

pub(crate) fn run(cfg: &EffectConfig) -> Result<()> {
    let mut app = App::init(cfg)?;
    app.run()
}

/// Keeps frames on a fixed schedule and measures the rate actually reached.
struct FramePacer {
    period: Duration,
    deadline: Instant,
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FramePacer {
    fn new(fps: u32, now: Instant) -> Self {
        let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        Self {
            period,
            deadline: now + period,
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Records a finished frame and returns how long to wait before the next.
    /// A frame that overran its slot restarts the schedule instead of
    /// bursting to catch up.
    fn finish_frame(&mut self, now: Instant) -> Duration {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= Duration::from_millis(500) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
        }

        let wait = self.deadline.saturating_duration_since(now);
        self.deadline = if wait.is_zero() {
            now + self.period
        } else {
            self.deadline + self.period
        };
        wait
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_frames_wait_out_the_rest_of_the_slot() {
        let t0 = Instant::now();
        let mut pacer = FramePacer::new(50, t0);
        let wait = pacer.finish_frame(t0 + Duration::from_millis(5));
        assert_eq!(wait, Duration::from_millis(15));
        let wait = pacer.finish_frame(t0 + Duration::from_millis(25));
        assert_eq!(wait, Duration::from_millis(15));
    }

    #[test]
    fn overrun_restarts_the_schedule() {
        let t0 = Instant::now();
        let mut pacer = FramePacer::new(50, t0);
        let late = t0 + Duration::from_millis(70);
        assert_eq!(pacer.finish_frame(late), Duration::ZERO);
        let wait = pacer.finish_frame(late + Duration::from_millis(1));
        assert_eq!(wait, Duration::from_millis(19));
    }

    #[test]
    fn fps_is_measured_over_half_second_windows() {
        let t0 = Instant::now();
        let mut pacer = FramePacer::new(60, t0);
        for i in 1..=30 {
            pacer.finish_frame(t0 + Duration::from_millis(20 * i));
        }
        assert!((pacer.fps() - 50.0).abs() < 0.5, "fps {}", pacer.fps());
    }
}

use std::time::{Duration, Instant};

const FPS_WINDOW_SECS: f32 = 0.5;

/// Frame delta plus a rolling FPS figure, refreshed twice a second.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Instant,
    frame_count: u32,
    pub frame_dt: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String, now: Instant) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: now,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            base_title,
        }
    }

    /// Advances one frame. Returns the FPS whenever a new reading is due.
    pub fn update(&mut self, now: Instant) -> Option<f32> {
        let dt = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time).as_secs_f32();
        if elapsed < FPS_WINDOW_SECS {
            return None;
        }
        let fps = self.frame_count as f32 / elapsed;
        self.frame_count = 0;
        self.last_fps_time = now;
        Some(fps)
    }

    pub fn title(&self, fps: f32, selection: &str) -> String {
        format!("{} - {fps:.1} fps | {selection}", self.base_title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_fps_once_the_window_elapses() {
        let start = Instant::now();
        let mut timing = FrameTiming::new("Stagehand".to_string(), start);

        assert_eq!(timing.update(start + Duration::from_millis(100)), None);
        assert_eq!(timing.update(start + Duration::from_millis(300)), None);
        assert!((timing.frame_dt - 0.2).abs() < 1e-4);

        let fps = timing
            .update(start + Duration::from_millis(500))
            .expect("fps after half a second");
        assert!((fps - 6.0).abs() < 1e-3);
        assert_eq!(timing.update(start + Duration::from_millis(600)), None);
        assert_eq!(timing.title(59.94, "Cube 1"), "Stagehand - 59.9 fps | Cube 1");
    }
}

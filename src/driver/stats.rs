use std::time::SystemTime;

/// Frame loop statistics
#[derive(Debug, Clone, Default)]
pub struct LoopStats {
    pub ticks: u64,
    pub frames_with_hand: u64,
    pub frame_errors: u64,
    pub inference_errors: u64,
    pub actions_applied: u64,
    pub last_tick_time: Option<SystemTime>,
}

impl LoopStats {
    pub fn record_tick(&mut self, hand_present: bool, actions: usize) {
        self.ticks += 1;
        if hand_present {
            self.frames_with_hand += 1;
        }
        self.actions_applied += actions as u64;
        self.last_tick_time = Some(SystemTime::now());
    }

    pub fn record_frame_error(&mut self) {
        self.frame_errors += 1;
        self.last_tick_time = Some(SystemTime::now());
    }

    pub fn record_inference_error(&mut self) {
        self.inference_errors += 1;
        self.last_tick_time = Some(SystemTime::now());
    }

    /// Share of processed ticks that saw a hand
    pub fn detection_rate(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.frames_with_hand as f64 / self.ticks as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

//! Serial controller chain: PI-D -> low-pass -> notch.

use crate::filters::{LowPassFilter, NotchFilter, PidFilter};

pub const KP_DEFAULT: f64 = 5e5;
pub const KI_DEFAULT: f64 = 10.0;
pub const KD_DEFAULT: f64 = 20.0;
pub const TS_DEFAULT: f64 = 1e-3;
pub const LPF_CUTOFF_HZ: f64 = 500.0;
pub const LPF_DAMPING: f64 = 0.8;
pub const NOTCH_ZERO_HZ: f64 = 100.0;
pub const NOTCH_POLE_HZ: f64 = 100.0;
pub const NOTCH_ZERO_DAMPING: f64 = 0.01;
pub const NOTCH_POLE_DAMPING: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct Controller {
    pid: PidFilter,
    lpf: LowPassFilter,
    notch: NotchFilter,
}

impl Controller {
    pub fn new() -> Self {
        Self {
            pid: PidFilter::new(KP_DEFAULT, KI_DEFAULT, KD_DEFAULT, TS_DEFAULT),
            lpf: LowPassFilter::new(LPF_CUTOFF_HZ, LPF_DAMPING, TS_DEFAULT),
            notch: NotchFilter::new(
                NOTCH_ZERO_HZ,
                NOTCH_POLE_HZ,
                NOTCH_ZERO_DAMPING,
                NOTCH_POLE_DAMPING,
                TS_DEFAULT,
            ),
        }
    }

    pub fn update(&mut self, error: f64) -> f64 {
        let pid_out = self.pid.update(error);
        let lpf_out = self.lpf.update(pid_out);
        self.notch.update(lpf_out)
    }

    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) {
        self.pid.set_gains(kp, ki, kd);
    }

    pub fn gains(&self) -> (f64, f64, f64) {
        (self.pid.kp, self.pid.ki, self.pid.kd)
    }

    pub fn reset(&mut self) {
        self.pid.reset();
        self.lpf.reset();
        self.notch.reset();
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gains_match_tuning_constants() {
        let ctrl = Controller::new();
        assert_eq!(ctrl.gains(), (KP_DEFAULT, KI_DEFAULT, KD_DEFAULT));
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let mut ctrl = Controller::new();
        for _ in 0..20 {
            ctrl.update(1e-6);
        }
        ctrl.reset();
        let mut fresh = Controller::new();
        assert_eq!(ctrl.update(1e-6), fresh.update(1e-6));
    }

    #[test]
    fn zero_sentinel_gain_update_leaves_others_unchanged() {
        let mut ctrl = Controller::new();
        ctrl.set_gains(1.0, 0.0, 0.0);
        assert_eq!(ctrl.gains(), (1.0, KI_DEFAULT, KD_DEFAULT));
    }
}

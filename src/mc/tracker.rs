// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

/// Acceptance bookkeeping and step-size tuning for one move.
///
/// While tuning is enabled the step size is nudged every `adjust_interval`
/// trials: up by `adjust_step` when the recent acceptance exceeds the target,
/// down otherwise, and clamped to `[min_step, max_step]`.
#[derive(Debug, Clone)]
pub struct StepTracker {
    step_size: f64,
    pub min_step: f64,
    pub max_step: f64,
    pub adjust_step: f64,
    pub adjust_interval: u64,
    pub target_acceptance: f64,
    tuning: bool,
    attempts: u64,
    accepted: u64,
    window_attempts: u64,
    window_accepted: u64,
}

impl StepTracker {
    pub fn new(step_size: f64, min_step: f64, max_step: f64) -> Self {
        assert!(
            0.0 < min_step && min_step <= max_step,
            "invalid step range [{min_step}, {max_step}]"
        );
        Self {
            step_size: step_size.clamp(min_step, max_step),
            min_step,
            max_step,
            adjust_step: 1.05,
            adjust_interval: 100,
            target_acceptance: 0.5,
            tuning: false,
            attempts: 0,
            accepted: 0,
            window_attempts: 0,
            window_accepted: 0,
        }
    }

    #[inline]
    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn set_step_size(&mut self, step_size: f64) {
        self.step_size = step_size.clamp(self.min_step, self.max_step);
    }

    pub fn set_tuning(&mut self, tuning: bool) {
        self.tuning = tuning;
        self.window_attempts = 0;
        self.window_accepted = 0;
    }

    pub fn is_tuning(&self) -> bool {
        self.tuning
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Overall acceptance ratio, or NaN before the first trial.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempts == 0 {
            return f64::NAN;
        }
        self.accepted as f64 / self.attempts as f64
    }

    /// Records the outcome of one trial.
    pub fn update(&mut self, accepted: bool) {
        self.attempts += 1;
        self.window_attempts += 1;
        if accepted {
            self.accepted += 1;
            self.window_accepted += 1;
        }
        if !self.tuning || self.window_attempts < self.adjust_interval {
            return;
        }
        let ratio = self.window_accepted as f64 / self.window_attempts as f64;
        self.step_size = if ratio > self.target_acceptance {
            self.step_size * self.adjust_step
        } else {
            self.step_size / self.adjust_step
        }
        .clamp(self.min_step, self.max_step);
        self.window_attempts = 0;
        self.window_accepted = 0;
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.accepted = 0;
        self.window_attempts = 0;
        self.window_accepted = 0;
    }
}

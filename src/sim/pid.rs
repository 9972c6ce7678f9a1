//! PID control law for the vertical descent.

/// Minimum dt between samples. Two calls sharing a timestamp would divide
/// by zero in the derivative term; the floor makes that impossible.
const MIN_DT: f64 = 1e-6;

/// Threshold the output must exceed for the thruster to fire.
const THRESHOLD: f64 = 0.5;

/// Stateful PID controller producing a scalar actuation signal.
///
/// The integral term is conditional: it accumulates only while the vehicle
/// moves in the direction that matches the sign of the error, and resets to
/// zero otherwise, so accumulated correction is dropped once the system is
/// already heading back toward the setpoint.
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    previous_error: f64,
    integral: f64,
    last_sample: Option<f64>,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            previous_error: 0.0,
            integral: 0.0,
            last_sample: None,
        }
    }

    /// Actuation threshold for the thruster.
    pub fn threshold(&self) -> f64 {
        THRESHOLD
    }

    /// Compute the control output for one sample.
    ///
    /// The first call after construction or [`reset`](Self::reset) only
    /// primes the sample clock and returns 0; no derivative or integral is
    /// available yet.
    pub fn compute(&mut self, setpoint: f64, measured: f64, velocity: f64, now: f64) -> f64 {
        let Some(last) = self.last_sample else {
            self.last_sample = Some(now);
            return 0.0;
        };
        let dt = (now - last).max(MIN_DT);
        self.last_sample = Some(now);

        let error = setpoint - measured;

        if (error < 0.0 && velocity < 0.0) || (error > 0.0 && velocity > 0.0) {
            self.integral += error * dt;
        } else {
            self.integral = 0.0;
        }

        let derivative = (error - self.previous_error) / dt;
        self.previous_error = error;

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    /// Clear accumulated state and the sample clock.
    pub fn reset(&mut self) {
        self.previous_error = 0.0;
        self.integral = 0.0;
        self.last_sample = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_primes_and_returns_zero() {
        let mut pid = PidController::new(0.5, 0.01, 0.1);
        assert_eq!(pid.compute(100.0, 50.0, 0.0, 0.0), 0.0);
        // Second call has a dt and produces a real output.
        let out = pid.compute(100.0, 50.0, 0.0, 1.0 / 60.0);
        assert!(out > 0.0);
    }

    #[test]
    fn test_duplicate_timestamp_stays_finite() {
        let mut pid = PidController::new(0.5, 0.01, 0.1);
        pid.compute(100.0, 50.0, 1.0, 1.0);
        let out = pid.compute(100.0, 40.0, 1.0, 1.0);
        assert!(out.is_finite());
    }

    #[test]
    fn test_integral_resets_when_moving_toward_setpoint() {
        let mut pid = PidController::new(0.0, 1.0, 0.0);
        pid.compute(0.0, 10.0, -1.0, 0.0);
        // error < 0, velocity < 0: worsening, integral accumulates.
        let worsening = pid.compute(0.0, 10.0, -1.0, 1.0);
        assert!(worsening < 0.0);
        // error < 0, velocity > 0: recovering, integral resets to zero.
        let recovering = pid.compute(0.0, 10.0, 1.0, 2.0);
        assert_eq!(recovering, 0.0);
    }

    #[test]
    fn test_derivative_tracks_error_change() {
        let mut pid = PidController::new(0.0, 0.0, 1.0);
        pid.compute(0.0, 0.0, 0.0, 0.0);
        pid.compute(0.0, 0.0, 0.0, 1.0);
        // Error jumps by -5 over 1 second: derivative term is -5.
        let out = pid.compute(0.0, 5.0, 0.0, 2.0);
        assert!((out - (-5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut pid = PidController::new(0.5, 0.5, 0.5);
        pid.compute(10.0, 0.0, 1.0, 0.0);
        pid.compute(10.0, 0.0, 1.0, 1.0);
        pid.reset();
        assert_eq!(pid.compute(10.0, 0.0, 1.0, 2.0), 0.0);
    }
}

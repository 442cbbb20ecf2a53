//! Timed transition between two viewpoints

use crate::foundation::math::Vec3;

use super::viewpoint::Viewpoint;

/// Shortest duration treated as an animation
pub const MIN_FLIGHT_DURATION_S: f64 = 1e-6;

/// Acceleration of the flight easing curve
pub const FLIGHT_ACCELERATION: f64 = 0.4;

/// Cubic ease, close to cosine interpolation
pub fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Rough approximation of `x.powf(y)` on [0, 1]
pub fn pow_fast(x: f64, y: f64) -> f64 {
    x / (x + y - y * x)
}

/// Acceleration curve, negative `a` decelerates
pub fn acceleration(t: f64, a: f64) -> f64 {
    if a == 0.0 {
        t
    } else if a > 0.0 {
        pow_fast(t, a)
    } else {
        1.0 - pow_fast(1.0 - t, -a)
    }
}

/// Animation state between two viewpoints
#[derive(Debug, Clone, PartialEq)]
pub struct FlightParams {
    /// Where the flight started
    pub start: Viewpoint,
    /// Where it lands
    pub end: Viewpoint,
    /// Pan offset when the flight started; decays to zero
    pub start_offset: Vec3,
    /// Length in seconds, zero when idle
    pub duration_s: f64,
    /// Clock reading at the start
    pub start_time_s: f64,
}

impl Default for FlightParams {
    fn default() -> Self {
        Self {
            start: Viewpoint::default(),
            end: Viewpoint::default(),
            start_offset: Vec3::zeros(),
            duration_s: 0.0,
            start_time_s: 0.0,
        }
    }
}

impl FlightParams {
    /// True while a flight is in progress
    pub fn valid(&self) -> bool {
        self.duration_s > MIN_FLIGHT_DURATION_S
    }

    /// Stop the flight where it is
    pub fn cancel(&mut self) {
        self.duration_s = 0.0;
    }

    /// Eased progress at `now_s`, ending the flight once time runs out
    ///
    /// Returns 1 on the final step.
    pub fn advance(&mut self, now_s: f64) -> f32 {
        let t = (now_s - self.start_time_s) / self.duration_s;
        if t >= 1.0 {
            self.cancel();
            return 1.0;
        }
        let t = acceleration(t.max(0.0), FLIGHT_ACCELERATION);
        smoothstep(smoothstep(t)) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_curves_fix_endpoints() {
        let curves: [fn(f64) -> f64; 3] = [smoothstep, |t| acceleration(t, 0.4), |t| acceleration(t, -0.4)];
        for curve in curves {
            assert_relative_eq!(curve(0.0), 0.0);
            assert_relative_eq!(curve(1.0), 1.0);
        }
        assert_relative_eq!(smoothstep(0.5), 0.5);
        assert_relative_eq!(acceleration(0.3, 0.0), 0.3);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut flight = FlightParams {
            duration_s: 1.0,
            ..FlightParams::default()
        };
        let mut last = 0.0;
        for step in 0..10 {
            let tp = flight.advance(step as f64 / 10.0);
            assert!(tp >= last);
            last = tp;
        }
        assert!(flight.valid());
    }

    #[test]
    fn test_finishes_at_duration() {
        let mut flight = FlightParams {
            duration_s: 2.0,
            start_time_s: 10.0,
            ..FlightParams::default()
        };
        assert!(flight.valid());
        assert_eq!(flight.advance(12.5), 1.0);
        assert!(!flight.valid());
    }
}

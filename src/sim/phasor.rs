//! Minimal complex arithmetic for AC current phasors.

use std::ops::{Add, AddAssign, Mul};

/// A current phasor in rectangular form (A).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Phasor {
    pub re: f64,
    pub im: f64,
}

impl Phasor {
    pub const ZERO: Phasor = Phasor { re: 0.0, im: 0.0 };

    /// Builds a phasor from a magnitude and an angle in degrees.
    pub fn from_polar_deg(magnitude: f64, angle_deg: f64) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        Self {
            re: magnitude * cos,
            im: magnitude * sin,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.re.hypot(self.im)
    }

    /// Angle in degrees, in `(-180, 180]`.
    pub fn angle_deg(&self) -> f64 {
        self.im.atan2(self.re).to_degrees()
    }
}

impl Add for Phasor {
    type Output = Phasor;

    fn add(self, rhs: Phasor) -> Phasor {
        Phasor {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl AddAssign for Phasor {
    fn add_assign(&mut self, rhs: Phasor) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl Mul<f64> for Phasor {
    type Output = Phasor;

    fn mul(self, rhs: f64) -> Phasor {
        Phasor {
            re: self.re * rhs,
            im: self.im * rhs,
        }
    }
}

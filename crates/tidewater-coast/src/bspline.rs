//! Uniform B-spline curves evaluated with de Boor's algorithm.
//!
//! Two knot layouts are supported:
//! - `Clamped`: the first and last knots are repeated `degree + 1` times,
//!   so the curve starts at the first control point and ends at the last.
//! - `Periodic`: uniform knots over the control points taken cyclically.
//!   The parameter wraps modulo 1 and the curve is closed and
//!   `C^(degree-1)` everywhere, including the seam.
//!
//! In both layouts the curve parameter runs over `[0, 1]`.

use glam::DVec2;

use crate::error::SplineError;

/// Knot vector layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnotMode {
    Clamped,
    Periodic,
}

/// A uniform B-spline curve in the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    degree: usize,
    control: Vec<DVec2>,
    mode: KnotMode,
}

impl BSpline {
    /// Open curve through its first and last control points.
    pub fn clamped(degree: usize, control: Vec<DVec2>) -> Result<Self, SplineError> {
        Self::with_mode(degree, control, KnotMode::Clamped)
    }

    /// Closed curve over cyclic control points.
    pub fn periodic(degree: usize, control: Vec<DVec2>) -> Result<Self, SplineError> {
        Self::with_mode(degree, control, KnotMode::Periodic)
    }

    fn with_mode(degree: usize, control: Vec<DVec2>, mode: KnotMode) -> Result<Self, SplineError> {
        if degree == 0 || control.len() < degree + 1 {
            return Err(SplineError::InvalidDegree {
                degree,
                control_points: control.len(),
            });
        }
        Ok(Self {
            degree,
            control,
            mode,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn control_points(&self) -> &[DVec2] {
        &self.control
    }

    pub fn mode(&self) -> KnotMode {
        self.mode
    }

    pub fn is_periodic(&self) -> bool {
        self.mode == KnotMode::Periodic
    }

    /// Knot value `t_j`.
    fn knot(&self, j: usize) -> f64 {
        match self.mode {
            KnotMode::Clamped => {
                let n = self.degree;
                let m = self.control.len();
                if j <= n {
                    0.0
                } else if j >= m {
                    1.0
                } else {
                    (j - n) as f64 / (m - n) as f64
                }
            }
            KnotMode::Periodic => j as f64,
        }
    }

    fn control_point(&self, i: usize) -> DVec2 {
        match self.mode {
            KnotMode::Clamped => self.control[i],
            KnotMode::Periodic => self.control[i % self.control.len()],
        }
    }

    /// Knot-space position and active span index for curve parameter `t`.
    fn locate(&self, t: f64) -> (f64, usize) {
        let n = self.degree;
        let m = self.control.len();
        match self.mode {
            KnotMode::Clamped => {
                let t = t.clamp(0.0, 1.0);
                let intervals = m - n;
                let span = ((t * intervals as f64).floor() as usize).min(intervals - 1);
                (t, n + span)
            }
            KnotMode::Periodic => {
                let s = n as f64 + t.rem_euclid(1.0) * m as f64;
                let span = (s.floor() as usize).clamp(n, n + m - 1);
                (s, span)
            }
        }
    }

    /// Point on the curve at parameter `t`.
    ///
    /// Clamped curves clamp `t` into `[0, 1]`; periodic curves wrap it.
    pub fn value(&self, t: f64) -> Result<DVec2, SplineError> {
        let n = self.degree;
        let (s, l) = self.locate(t);

        let mut d: Vec<DVec2> = (0..=n).map(|j| self.control_point(l - n + j)).collect();
        for r in 1..=n {
            for j in (r..=n).rev() {
                let i = l - n + j;
                let lo = self.knot(i);
                let alpha = (s - lo) / (self.knot(i + n + 1 - r) - lo);
                if !alpha.is_finite() {
                    return Err(SplineError::NonFiniteWeight { t });
                }
                d[j] = d[j - 1] * (1.0 - alpha) + d[j] * alpha;
            }
        }
        Ok(d[n])
    }

    /// `intervals + 1` evenly spaced points over `[t0, t1]`.
    pub fn sample(&self, t0: f64, t1: f64, intervals: usize) -> Result<Vec<DVec2>, SplineError> {
        let intervals = intervals.max(1);
        (0..=intervals)
            .map(|i| self.value(t0 + (t1 - t0) * i as f64 / intervals as f64))
            .collect()
    }
}

//! Curve fitting: turns a traced boundary chain into a B-spline in world
//! coordinates.

use glam::DVec2;
use tidewater_core::constants::MAX_SPLINE_DEGREE;
use tidewater_core::enums::Border;

use crate::bspline::BSpline;
use crate::descriptor::CoastSettings;
use crate::error::SplineError;
use crate::projection::MaskProjection;
use crate::trace::BoundaryChain;

/// A fitted coastline. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub spline: BSpline,
    /// Map side the curve starts on; `None` for closed curves.
    pub begin_border: Option<Border>,
    /// Map side the curve ends on; `None` for closed curves.
    pub end_border: Option<Border>,
    /// Vertices of the chain the curve was fitted to.
    pub vertex_count: usize,
    samples_per_control_interval: usize,
}

impl Curve {
    /// Fit a curve to `chain`.
    ///
    /// Control points are every `control_point_stride`-th vertex; open chains
    /// always keep their last vertex so the curve ends on the map border.
    pub fn fit(
        chain: &BoundaryChain,
        projection: &MaskProjection,
        settings: &CoastSettings,
    ) -> Result<Curve, SplineError> {
        let requested = settings.spline_degree.clamp(1, MAX_SPLINE_DEGREE);
        let world: Vec<DVec2> = chain.points.iter().map(|&p| projection.to_world(p)).collect();

        let mut control = downsample(&world, settings.control_point_stride, chain.cyclic);
        if control.len() < requested + 1 {
            control = world;
        }

        let degree = requested.min(control.len().saturating_sub(1));
        let spline = if chain.cyclic {
            BSpline::periodic(degree, control)?
        } else {
            BSpline::clamped(degree, control)?
        };

        Ok(Curve::from_spline(
            spline,
            chain.begin_border,
            chain.end_border,
            chain.points.len(),
            settings.samples_per_control_interval,
        ))
    }

    /// Wrap an already built spline.
    pub fn from_spline(
        spline: BSpline,
        begin_border: Option<Border>,
        end_border: Option<Border>,
        vertex_count: usize,
        samples_per_control_interval: usize,
    ) -> Curve {
        Curve {
            spline,
            begin_border,
            end_border,
            vertex_count,
            samples_per_control_interval: samples_per_control_interval.max(1),
        }
    }

    pub fn is_cyclic(&self) -> bool {
        self.spline.is_periodic()
    }

    pub fn control_count(&self) -> usize {
        self.spline.control_points().len()
    }

    pub fn value(&self, t: f64) -> Result<DVec2, SplineError> {
        self.spline.value(t)
    }

    /// Curve parameter corresponding to chain vertex `k`.
    ///
    /// Open chains spread their vertices evenly over `[0, 1]`. Closed chains
    /// use `k / N`, shifted so each control point's vertex lands where that
    /// control point has the most influence. Indices outside the chain are
    /// extrapolated; for closed curves that continues into the next period.
    pub fn param_of_vertex(&self, k: isize) -> f64 {
        let n = self.vertex_count as f64;
        if self.is_cyclic() {
            let m = self.control_count() as f64;
            let shift = (self.spline.degree() as f64 - 1.0) / (2.0 * m);
            k as f64 / n - shift
        } else if self.vertex_count < 2 {
            0.0
        } else {
            (k as f64 / (n - 1.0)).clamp(0.0, 1.0)
        }
    }

    /// Resampling density per unit of curve parameter at detail level 0.
    pub fn samples_per_unit_t(&self) -> usize {
        self.control_count() * self.samples_per_control_interval
    }
}

fn downsample(points: &[DVec2], stride: usize, cyclic: bool) -> Vec<DVec2> {
    let stride = stride.max(1);
    let mut control: Vec<DVec2> = points.iter().copied().step_by(stride).collect();
    if !cyclic && points.len() > 1 && (points.len() - 1) % stride != 0 {
        if let Some(&last) = points.last() {
            control.push(last);
        }
    }
    control
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidewater_core::types::GridPoint;

    fn square_chain(side: i32) -> BoundaryChain {
        // Clockwise with y up: up the west side, east along the top, down, back west.
        let mut points = Vec::new();
        for y in 0..side {
            points.push(GridPoint::new(0, y));
        }
        for x in 0..side {
            points.push(GridPoint::new(x, side));
        }
        for y in (1..=side).rev() {
            points.push(GridPoint::new(side, y));
        }
        for x in (1..=side).rev() {
            points.push(GridPoint::new(x, 0));
        }
        BoundaryChain {
            points,
            cyclic: true,
            begin_border: None,
            end_border: None,
            turn_count: -4,
        }
    }

    fn line_chain(len: i32) -> BoundaryChain {
        BoundaryChain {
            points: (0..=len).map(|x| GridPoint::new(x, 3)).collect(),
            cyclic: false,
            begin_border: Some(Border::Left),
            end_border: Some(Border::Right),
            turn_count: 0,
        }
    }

    fn projection() -> MaskProjection {
        MaskProjection::new(DVec2::ZERO, 1000.0)
    }

    #[test]
    fn test_stride_downsamples_closed_chain() {
        let chain = square_chain(8);
        assert_eq!(chain.points.len(), 32);
        let curve = Curve::fit(&chain, &projection(), &CoastSettings::default()).unwrap();
        assert!(curve.is_cyclic());
        assert_eq!(curve.control_count(), 16);
        assert_eq!(curve.spline.degree(), 3);
        assert_eq!(curve.samples_per_unit_t(), 64);
    }

    #[test]
    fn test_open_chain_keeps_last_vertex() {
        let chain = line_chain(7);
        let curve = Curve::fit(&chain, &projection(), &CoastSettings::default()).unwrap();
        // Vertices 0, 2, 4, 6 plus the final vertex 7.
        assert_eq!(curve.control_count(), 5);
        assert!((curve.value(0.0).unwrap() - DVec2::new(0.0, 3000.0)).length() < 1e-9);
        assert!((curve.value(1.0).unwrap() - DVec2::new(7000.0, 3000.0)).length() < 1e-9);
        assert_eq!(curve.begin_border, Some(Border::Left));
        assert_eq!(curve.end_border, Some(Border::Right));
    }

    #[test]
    fn test_short_chain_lowers_degree() {
        let chain = line_chain(1);
        let curve = Curve::fit(&chain, &projection(), &CoastSettings::default()).unwrap();
        assert_eq!(curve.control_count(), 2);
        assert_eq!(curve.spline.degree(), 1);
    }

    #[test]
    fn test_single_pixel_island_is_not_downsampled() {
        let chain = square_chain(1);
        let curve = Curve::fit(&chain, &projection(), &CoastSettings::default()).unwrap();
        assert_eq!(curve.control_count(), 4);
        assert_eq!(curve.spline.degree(), 3);
    }

    #[test]
    fn test_vertex_parameters_track_the_curve() {
        let chain = square_chain(16);
        let curve = Curve::fit(&chain, &projection(), &CoastSettings::default()).unwrap();
        // Mid-side vertices sit on straight runs, where the spline reproduces them.
        for k in [8usize, 24, 40, 56] {
            let expected = projection().to_world(chain.points[k]);
            let got = curve.value(curve.param_of_vertex(k as isize)).unwrap();
            assert!((got - expected).length() < 1e-6, "vertex {k}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_open_parameters_span_unit_interval() {
        let curve = Curve::fit(&line_chain(10), &projection(), &CoastSettings::default()).unwrap();
        assert_eq!(curve.param_of_vertex(0), 0.0);
        assert_eq!(curve.param_of_vertex(10), 1.0);
        assert!((curve.param_of_vertex(5) - 0.5).abs() < 1e-12);
    }
}

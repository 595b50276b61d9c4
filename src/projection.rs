//! Mapping fix coordinates onto a drawing plane.
//!
//! Everything that turns a latitude/longitude into plane coordinates goes through the
//! [`Projector`] trait. Two implementations exist:
//!
//! - [`MercatorProjector`]: pure math over a bounds rectangle and a [`Viewport`].
//!   Longitude maps linearly; latitude goes through a spherical-Mercator correction so
//!   north-south spacing matches what a map shows. North is up (higher latitude, lower y).
//! - [`HostProjector`]: delegates to the host map widget's own screen projection.

use crate::{Bounds, Fix, ProjectedPoint, Viewport};

/// Latitudes are clamped to +/- this many degrees before the Mercator transform.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.0;

/// Substitute span for a degenerate (zero-width) axis range.
pub const DEGENERATE_RANGE_EPSILON: f64 = 0.001;

/// Capability to place a geographic coordinate on the drawing plane.
pub trait Projector {
    fn project(&self, latitude: f64, longitude: f64) -> ProjectedPoint;

    fn project_fix(&self, fix: &Fix) -> ProjectedPoint {
        self.project(fix.latitude, fix.longitude)
    }
}

impl<P: Projector + ?Sized> Projector for &P {
    fn project(&self, latitude: f64, longitude: f64) -> ProjectedPoint {
        (**self).project(latitude, longitude)
    }
}

/// Spherical-Mercator vertical coordinate of a latitude in degrees.
///
/// The input is clamped to [`MAX_MERCATOR_LATITUDE`] so the result is always finite.
#[inline]
pub fn mercator_y(latitude: f64) -> f64 {
    let clamped = latitude.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
    (std::f64::consts::FRAC_PI_4 + clamped.to_radians() / 2.0).tan().ln()
}

#[inline]
fn non_degenerate(range: f64) -> f64 {
    if range == 0.0 {
        DEGENERATE_RANGE_EPSILON
    } else {
        range
    }
}

/// Bounds-based projector.
///
/// The Mercator extremes and axis ranges are computed once on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjector {
    bounds: Bounds,
    viewport: Viewport,
    merc_max: f64,
    merc_range: f64,
    lon_range: f64,
}

impl MercatorProjector {
    pub fn new(bounds: Bounds, viewport: Viewport) -> Self {
        let merc_min = mercator_y(bounds.min_lat);
        let merc_max = mercator_y(bounds.max_lat);
        Self {
            bounds,
            viewport,
            merc_max,
            merc_range: non_degenerate(merc_max - merc_min),
            lon_range: non_degenerate(bounds.max_lon - bounds.min_lon),
        }
    }
}

impl Projector for MercatorProjector {
    fn project(&self, latitude: f64, longitude: f64) -> ProjectedPoint {
        let padding = self.viewport.padding;
        let inner_width = self.viewport.width - 2.0 * padding;
        let inner_height = self.viewport.height - 2.0 * padding;

        let x = padding + (longitude - self.bounds.min_lon) / self.lon_range * inner_width;
        let y = padding + (self.merc_max - mercator_y(latitude)) / self.merc_range * inner_height;

        ProjectedPoint::new(x, y)
    }
}

/// Convenience one-shot projection of a single coordinate.
pub fn lat_lon_to_plane(latitude: f64, longitude: f64, bounds: &Bounds, viewport: &Viewport) -> ProjectedPoint {
    MercatorProjector::new(*bounds, *viewport).project(latitude, longitude)
}

/// Projector backed by the host map component's coordinate-to-screen function.
///
/// Points the host cannot place should come back non-finite; the pipeline drops them.
pub struct HostProjector<F> {
    point_for_coordinate: F,
}

impl<F> HostProjector<F>
where
    F: Fn(f64, f64) -> ProjectedPoint,
{
    pub fn new(point_for_coordinate: F) -> Self {
        Self { point_for_coordinate }
    }
}

impl<F> Projector for HostProjector<F>
where
    F: Fn(f64, f64) -> ProjectedPoint,
{
    fn project(&self, latitude: f64, longitude: f64) -> ProjectedPoint {
        (self.point_for_coordinate)(latitude, longitude)
    }
}

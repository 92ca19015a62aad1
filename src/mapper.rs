//! Mapping from source coordinates into the ILDA signed 16-bit space.
//!
//! Both axes share one scale factor (the smaller of the width and height
//! fits) so aspect ratio is preserved, the source box is centered on the
//! origin, and y is flipped because ILDA's +y points up.

use crate::bounds::Bounds;
use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Stage;
use crate::ilda::format::COORD_MAX;
use crate::optimize::OrderedPath;
use crate::types::{Color, XForm};

/// Point in ILDA coordinates, always within `[-32767, 32767]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedPoint {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub blanked: bool,
}

/// An ordered path after mapping. Topology and flags are unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedPath {
    pub points: Vec<MappedPoint>,
    pub closed: bool,
    pub leading_blank: bool,
    pub color: Option<Color>,
    pub source_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub paths: Vec<MappedPath>,
    /// Source (x, y) to ILDA (x, y), before rounding
    pub transform: XForm,
}

/// Scale factor fitting `bounds` into `span` units on both axes.
fn fit_scale(bounds: &Bounds, span: f64) -> f64 {
    let fits = [bounds.width(), bounds.height()]
        .into_iter()
        .filter(|&extent| extent > 0.0)
        .map(|extent| span / extent);
    let scale = fits.fold(f64::INFINITY, f64::min);
    if scale.is_finite() { scale } else { 1.0 }
}

/// Map every ordered path into ILDA coordinates.
///
/// The source box is `config.source_bounds` or the tight box of all points.
/// Values that still fall outside the range (possible only with an explicit
/// box smaller than the artwork) are clamped and reported once.
pub fn map_paths(
    ordered: Vec<OrderedPath>,
    config: &PipelineConfig,
    diagnostics: &mut Diagnostics,
) -> Mapping {
    let bounds = config.source_bounds.unwrap_or_else(|| {
        let mut b = Bounds::empty();
        for o in &ordered {
            b.merge(&o.path.bounds());
        }
        b
    });

    if !bounds.is_valid() {
        return Mapping {
            paths: Vec::new(),
            transform: XForm::identity(),
        };
    }

    let span = 2.0 * f64::from(COORD_MAX) * config.scale_margin;
    let scale = fit_scale(&bounds, span);
    let (cx, cy) = bounds.center();
    let transform = XForm {
        a: scale,
        b: 0.0,
        c: 0.0,
        d: -scale,
        e: -cx * scale,
        f: cy * scale,
    };

    let (z_min, z_max) = ordered
        .iter()
        .flat_map(|o| o.path.points.iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.z), hi.max(p.z))
        });
    let flat = !(z_min.is_finite() && z_max.is_finite()) || (z_min == 0.0 && z_max == 0.0);
    let cz = (z_min + z_max) / 2.0;

    let mut clamped = 0usize;
    let mut to_i16 = |v: f64| -> i16 {
        let r = v.round();
        let limit = f64::from(COORD_MAX);
        if r > limit || r < -limit {
            clamped += 1;
        }
        r.clamp(-limit, limit) as i16
    };

    let paths: Vec<MappedPath> = ordered
        .into_iter()
        .map(|o| {
            let points = o
                .path
                .points
                .iter()
                .map(|p| {
                    let (x, y) = transform.transform_point(p.x, p.y);
                    let z = if flat { config.z } else { (p.z - cz) * scale };
                    MappedPoint {
                        x: to_i16(x),
                        y: to_i16(y),
                        z: to_i16(z),
                        blanked: p.blanked,
                    }
                })
                .collect();

            MappedPath {
                points,
                closed: o.path.closed,
                leading_blank: o.leading_blank,
                color: o.path.color,
                source_index: o.source_index,
            }
        })
        .collect();

    if clamped > 0 {
        diagnostics.push(
            Stage::CoordinateMapper,
            None,
            format!("clamped {} coordinates into the signed 16-bit range", clamped),
        );
    }

    tracing::debug!(
        scale,
        center_x = cx,
        center_y = cy,
        paths = paths.len(),
        "coordinates mapped"
    );

    Mapping { paths, transform }
}

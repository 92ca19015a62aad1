//! Path normalization
//!
//! Merges traced pixel contours and flattened vector paths into one
//! [`PathSet`] in a single coordinate convention (origin top-left, +x right,
//! +y down), and cleans up geometry the later stages should never see:
//! repeated points, non-finite coordinates, and paths left with no points.

use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Stage;
use crate::types::{Path, PathSet, Point};
use crate::vector::YAxis;

/// Merge pixel paths and flattened vector paths into one normalized set.
///
/// Pixel paths keep their indices and come first; vector paths follow in
/// input order. Paths that lose every point are dropped with a diagnostic
/// and parent links into them are cleared.
pub fn normalize(
    pixel_paths: PathSet,
    vector_paths: PathSet,
    config: &PipelineConfig,
    diagnostics: &mut Diagnostics,
) -> PathSet {
    let mut merged = pixel_paths.into_paths();
    let pixel_count = merged.len();

    for mut path in vector_paths {
        if config.vector_y_axis == YAxis::Up {
            for p in &mut path.points {
                p.y = -p.y;
            }
        }
        // Vector parents index the vector set; shift them past the pixel paths.
        path.parent = path.parent.map(|p| p + pixel_count);
        merged.push(path);
    }

    tracing::debug!(
        pixel = pixel_count,
        vector = merged.len() - pixel_count,
        "paths merged"
    );

    let mut remap: Vec<Option<usize>> = Vec::with_capacity(merged.len());
    let mut kept: Vec<Path> = Vec::with_capacity(merged.len());

    for (i, mut path) in merged.into_iter().enumerate() {
        let before = path.len();
        path.points = clean_points(path.points, path.closed);

        let removed = before - path.len();
        if path.is_empty() {
            diagnostics.push(
                Stage::PathNormalizer,
                Some(i),
                "path has no usable points left and was dropped",
            );
            remap.push(None);
            continue;
        }
        if removed > 0 {
            tracing::trace!(index = i, removed, "points collapsed");
        }

        remap.push(Some(kept.len()));
        kept.push(path);
    }

    for path in &mut kept {
        path.parent = path.parent.and_then(|p| remap.get(p).copied().flatten());
    }

    let result: PathSet = kept.into();
    tracing::debug!(
        paths = result.len(),
        points = result.point_count(),
        "paths normalized"
    );
    result
}

/// Drop non-finite points and collapse consecutive duplicates.
///
/// A collapsed point passes its blank flag on to the point it merges into.
/// For closed paths a trailing copy of the first point is removed as well,
/// since the closing segment is implicit.
fn clean_points(points: Vec<Point>, closed: bool) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());

    for p in points {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.same_position(&p) => last.blanked |= p.blanked,
            _ => out.push(p),
        }
    }

    if closed {
        while out.len() > 1 && out[out.len() - 1].same_position(&out[0]) {
            if let Some(last) = out.pop() {
                out[0].blanked |= last.blanked;
            }
        }
    }

    out
}

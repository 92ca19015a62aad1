//! Douglas-Peucker polyline simplification.
//!
//! Every removed point lies within `epsilon` of the output polyline. Path
//! endpoints and explicitly blanked points are always kept. Closed paths are
//! treated as cyclic: they are split at the point farthest from the first
//! point (lowest index on ties) and both halves are reduced, so the output
//! still starts at the original first point and closes on it.

use crate::types::{Path, PathSet, Point};

/// Simplify every path in the set with the same tolerance.
pub fn simplify_paths(paths: PathSet, epsilon: f64) -> PathSet {
    let before = paths.point_count();
    let simplified: PathSet = paths
        .into_iter()
        .map(|path| simplify_path(&path, epsilon))
        .collect();

    tracing::debug!(
        epsilon,
        before,
        after = simplified.point_count(),
        "paths simplified"
    );
    simplified
}

/// Simplify one path. `epsilon <= 0` returns the path unchanged.
pub fn simplify_path(path: &Path, epsilon: f64) -> Path {
    let n = path.points.len();
    if epsilon <= 0.0 || n < 3 {
        return path.clone();
    }

    let points = &path.points;
    let mut keep = vec![false; n];
    keep[0] = true;
    for (i, p) in points.iter().enumerate() {
        if p.blanked {
            keep[i] = true;
        }
    }

    if path.closed {
        if let Some(split) = farthest_from_first(points) {
            keep[split] = true;
        }
    } else {
        keep[n - 1] = true;
    }

    let anchors: Vec<usize> = (0..n).filter(|&i| keep[i]).collect();
    for pair in anchors.windows(2) {
        reduce(points, pair[0], pair[1], epsilon, &mut keep);
    }
    if path.closed {
        // Closing chain wraps back onto point 0 (index n).
        let last = anchors.last().copied().unwrap_or(0);
        reduce(points, last, n, epsilon, &mut keep);
    }

    Path {
        points: points
            .iter()
            .zip(&keep)
            .filter(|&(_, &k)| k)
            .map(|(p, _)| *p)
            .collect(),
        ..path.clone()
    }
}

fn farthest_from_first(points: &[Point]) -> Option<usize> {
    let origin = points[0];
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = p.distance(&origin);
        if d > best.map_or(0.0, |(_, bd)| bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Mark the points of `first..=last` (indices taken modulo the point count)
/// that must stay to keep the chain within `epsilon`.
fn reduce(points: &[Point], first: usize, last: usize, epsilon: f64, keep: &mut [bool]) {
    let n = points.len();
    let mut stack = vec![(first, last)];

    while let Some((a, b)) = stack.pop() {
        if b <= a + 1 {
            continue;
        }

        let pa = points[a % n];
        let pb = points[b % n];
        let mut split: Option<(usize, f64)> = None;
        for i in (a + 1)..b {
            let d = points[i % n].distance_to_segment(&pa, &pb);
            if d > split.map_or(0.0, |(_, sd)| sd) {
                split = Some((i, d));
            }
        }

        if let Some((i, d)) = split
            && d > epsilon
        {
            keep[i % n] = true;
            stack.push((a, i));
            stack.push((i, b));
        }
    }
}

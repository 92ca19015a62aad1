//! Vector path input
//!
//! Path primitives as produced by a vector source (an SVG document, or a
//! caller building shapes by hand), and the flattening of their curves into
//! polylines. Flattening happens here, before normalization, so everything
//! downstream only ever sees straight segments.

pub mod svg;

use crate::bounds::{cubic_point, quad_point};
use crate::types::{Color, Path, PathSet, Point};

/// Direction of +y in supplied vector coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YAxis {
    /// +y points down (SVG, raster images)
    #[default]
    Down,
    /// +y points up (plotter and CAD conventions)
    Up,
}

/// One drawing primitive. Control points come before the end point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    /// Travel with the laser off; the destination point is blanked
    BlankTo(Point),
    Close,
}

/// Sequence of primitives sharing one color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorPath {
    pub segments: Vec<Segment>,
    pub color: Option<Color>,
}

impl VectorPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.segments.push(Segment::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.segments.push(Segment::LineTo(Point::new(x, y)));
        self
    }

    pub fn quad_to(mut self, cx: f64, cy: f64, x: f64, y: f64) -> Self {
        self.segments
            .push(Segment::QuadTo(Point::new(cx, cy), Point::new(x, y)));
        self
    }

    pub fn cubic_to(mut self, c0x: f64, c0y: f64, c1x: f64, c1y: f64, x: f64, y: f64) -> Self {
        self.segments.push(Segment::CubicTo(
            Point::new(c0x, c0y),
            Point::new(c1x, c1y),
            Point::new(x, y),
        ));
        self
    }

    pub fn blank_to(mut self, x: f64, y: f64) -> Self {
        self.segments.push(Segment::BlankTo(Point::new(x, y)));
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(Segment::Close);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Upper bound on segments generated for one curve.
const MAX_CURVE_STEPS: usize = 1024;

/// Number of uniform steps that keeps a Bezier curve within `tolerance` of
/// its chords (Wang's formula). `degree_factor` is d(d-1)/8 for degree d and
/// `second_diff` the largest second difference of the control polygon.
fn curve_steps(degree_factor: f64, second_diff: f64, tolerance: f64) -> usize {
    if second_diff <= 0.0 {
        return 1;
    }
    let steps = (degree_factor * second_diff / tolerance).sqrt().ceil();
    (steps as usize).clamp(1, MAX_CURVE_STEPS)
}

fn second_diff(a: &Point, b: &Point, c: &Point) -> f64 {
    let dx = a.x - 2.0 * b.x + c.x;
    let dy = a.y - 2.0 * b.y + c.y;
    let dz = a.z - 2.0 * b.z + c.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Subpath being accumulated while walking the primitives.
struct Builder {
    points: Vec<Point>,
    drawn: bool,
    start: Option<Point>,
}

impl Builder {
    fn new() -> Self {
        Self {
            points: Vec::new(),
            drawn: false,
            start: None,
        }
    }

    fn pen(&self) -> Option<Point> {
        self.points.last().copied().or(self.start)
    }

    /// Begin drawing at the pen if nothing is in progress.
    fn ensure_started(&mut self, fallback: Point) -> Point {
        if self.points.is_empty() {
            let start = self.start.unwrap_or(fallback);
            self.start = Some(start);
            self.points.push(start);
        }
        self.pen().unwrap_or(fallback)
    }

    fn finish(&mut self, closed: bool, color: Option<Color>, out: &mut Vec<Path>) {
        let points = std::mem::take(&mut self.points);
        if (self.drawn || closed) && !points.is_empty() {
            out.push(Path {
                points,
                closed,
                hole: false,
                parent: None,
                color,
            });
        }
        self.drawn = false;
    }
}

/// Flatten one vector path into polylines.
///
/// Every `MoveTo` that follows drawing and every `Close` ends the current
/// polyline. A subpath with no drawing primitive (a lone `MoveTo`) yields
/// nothing. Curves are split into enough straight segments to stay within
/// `tolerance`.
pub fn flatten(path: &VectorPath, tolerance: f64) -> Vec<Path> {
    let mut out = Vec::new();
    let mut b = Builder::new();

    for segment in &path.segments {
        match *segment {
            Segment::MoveTo(p) => {
                b.finish(false, path.color, &mut out);
                b.start = Some(p);
                b.points.push(p);
            }
            Segment::LineTo(p) => {
                b.ensure_started(p);
                b.points.push(p);
                b.drawn = true;
            }
            Segment::BlankTo(p) => {
                b.ensure_started(p);
                b.points.push(p.with_blanked(true));
                b.drawn = true;
            }
            Segment::QuadTo(c, p) => {
                let p0 = b.ensure_started(c);
                let steps = curve_steps(0.25, second_diff(&p0, &c, &p), tolerance);
                for i in 1..=steps {
                    let t = i as f64 / steps as f64;
                    b.points.push(quad_point(t, p0, c, p));
                }
                b.drawn = true;
            }
            Segment::CubicTo(c0, c1, p) => {
                let p0 = b.ensure_started(c0);
                let diff = second_diff(&p0, &c0, &c1).max(second_diff(&c0, &c1, &p));
                let steps = curve_steps(0.75, diff, tolerance);
                for i in 1..=steps {
                    let t = i as f64 / steps as f64;
                    b.points.push(cubic_point(t, p0, c0, c1, p));
                }
                b.drawn = true;
            }
            Segment::Close => {
                b.finish(true, path.color, &mut out);
                // Drawing after a close continues from the subpath start.
            }
        }
    }
    b.finish(false, path.color, &mut out);

    out
}

/// Flatten every vector path, keeping input order.
pub fn flatten_all(paths: &[VectorPath], tolerance: f64) -> PathSet {
    let flat: PathSet = paths
        .iter()
        .flat_map(|vp| flatten(vp, tolerance))
        .collect();
    tracing::debug!(
        input = paths.len(),
        paths = flat.len(),
        points = flat.point_count(),
        "vector paths flattened"
    );
    flat
}

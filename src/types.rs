use crate::bounds::Bounds;
use crate::error::{IldaError, Result, Stage};

/// Point in source space (pixels or SVG user units), +x right, +y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Depth; 0 for 2D input
    pub z: f64,
    /// Explicit pen-up marker carried through from vector input
    pub blanked: bool,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            blanked: false,
        }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            blanked: false,
        }
    }

    pub fn with_blanked(mut self, blanked: bool) -> Self {
        self.blanked = blanked;
        self
    }

    /// True when both points sit at the same coordinates, ignoring flags.
    pub fn same_position(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    /// Distance from this point to the segment `a`-`b`.
    pub fn distance_to_segment(&self, a: &Point, b: &Point) -> f64 {
        let (dx, dy, dz) = (b.x - a.x, b.y - a.y, b.z - a.z);
        let len_sq = dx * dx + dy * dy + dz * dz;
        if len_sq == 0.0 {
            return self.distance(a);
        }

        let t = (((self.x - a.x) * dx + (self.y - a.y) * dy + (self.z - a.z) * dz) / len_sq)
            .clamp(0.0, 1.0);
        let projected = Point::new_3d(a.x + t * dx, a.y + t * dy, a.z + t * dz);
        self.distance(&projected)
    }
}

/// 24-bit color carried inline by true-color records and palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Color of a path or scan point, either a palette index or inline RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Indexed(u8),
    Rgb(Rgb),
}

/// Ordered polyline owned by a [`PathSet`].
///
/// A closed path's implicit last-to-first segment is drawn; an open path has
/// no such segment. Paths built through [`Path::new`] hold at least one point.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub points: Vec<Point>,
    pub closed: bool,
    /// Contour is the border of a hole (even nesting parity)
    pub hole: bool,
    /// Index of the enclosing contour in the same [`PathSet`]
    pub parent: Option<usize>,
    /// Caller-assigned color; `None` falls back to the configured default
    pub color: Option<Color>,
}

impl Path {
    pub fn new(points: Vec<Point>, closed: bool) -> Result<Self> {
        if points.is_empty() {
            return Err(IldaError::geometry(
                Stage::PathNormalizer,
                None,
                "a path needs at least one point",
            ));
        }

        Ok(Self {
            points,
            closed,
            hole: false,
            parent: None,
            color: None,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Where the pen rests after drawing this path.
    pub fn exit_point(&self) -> Option<&Point> {
        if self.closed {
            self.first()
        } else {
            self.last()
        }
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for p in &self.points {
            bounds.update(p.x, p.y);
        }
        bounds
    }
}

/// Set of paths produced by extraction and normalization.
///
/// Unordered at creation; the optimizer decides traversal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSet {
    paths: Vec<Path>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn paths_mut(&mut self) -> &mut [Path] {
        &mut self.paths
    }

    pub fn into_paths(self) -> Vec<Path> {
        self.paths
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Path> {
        self.paths.iter()
    }

    /// Total number of points across all paths.
    pub fn point_count(&self) -> usize {
        self.paths.iter().map(Path::len).sum()
    }

    /// Tight bounding box of every point in the set.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for path in &self.paths {
            bounds.merge(&path.bounds());
        }
        bounds
    }

    /// Apply a caller-supplied color mapping; `None` leaves a path untouched.
    pub fn assign_colors<F>(&mut self, mut color_for: F)
    where
        F: FnMut(usize, &Path) -> Option<Color>,
    {
        for (i, path) in self.paths.iter_mut().enumerate() {
            if let Some(color) = color_for(i, path) {
                path.color = Some(color);
            }
        }
    }
}

impl From<Vec<Path>> for PathSet {
    fn from(paths: Vec<Path>) -> Self {
        Self { paths }
    }
}

impl FromIterator<Path> for PathSet {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for PathSet {
    type Item = Path;
    type IntoIter = std::vec::IntoIter<Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a Path;
    type IntoIter = std::slice::Iter<'a, Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// 2D affine transformation matrix [a, b, c, d, e, f]
/// Represents: | a  c  e |
///             | b  d  f |
///             | 0  0  1 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XForm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl XForm {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    /// Compose two transforms: self * other
    pub fn compose(&self, other: &XForm) -> XForm {
        XForm {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Transform a point
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Inverse transform, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<XForm> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }

        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(XForm {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rejects_zero_points() {
        assert!(Path::new(Vec::new(), true).is_err());
        assert!(Path::new(vec![Point::new(1.0, 1.0)], true).is_ok());
    }

    #[test]
    fn test_exit_point_depends_on_closure() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)];
        let open = Path::new(pts.clone(), false).unwrap();
        let closed = Path::new(pts, true).unwrap();
        assert_eq!(open.exit_point(), Some(&Point::new(5.0, 0.0)));
        assert_eq!(closed.exit_point(), Some(&Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_distance_to_segment_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(Point::new(5.0, 3.0).distance_to_segment(&a, &b), 3.0);
        assert_eq!(Point::new(13.0, 4.0).distance_to_segment(&a, &b), 5.0);
        assert_eq!(Point::new(3.0, 4.0).distance_to_segment(&a, &a), 5.0);
    }

    #[test]
    fn test_xform_inverse_round_trips() {
        let xf = XForm::translate(10.0, -4.0).compose(&XForm::scale(2.0, -3.0));
        let inv = xf.inverse().unwrap();
        let (x, y) = xf.transform_point(1.5, 7.0);
        let (bx, by) = inv.transform_point(x, y);
        assert!((bx - 1.5).abs() < 1e-9);
        assert!((by - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_xform_has_no_inverse() {
        assert!(XForm::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_assign_colors_skips_none() {
        let mut set: PathSet = vec![
            Path::new(vec![Point::new(0.0, 0.0)], true).unwrap(),
            Path::new(vec![Point::new(1.0, 0.0)], true).unwrap(),
        ]
        .into();
        set.assign_colors(|i, _| (i == 1).then_some(Color::Indexed(7)));
        assert_eq!(set.paths()[0].color, None);
        assert_eq!(set.paths()[1].color, Some(Color::Indexed(7)));
    }
}

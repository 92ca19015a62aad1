//! SVG documents as vector path input, via `usvg`.
//!
//! usvg resolves shapes, `use` references and CSS into plain paths; this
//! adapter walks the resulting tree, bakes each path's absolute transform into
//! its coordinates and carries solid stroke colors (falling back to fill).
//! Text and embedded images are ignored.

use std::path::Path;

use usvg::tiny_skia_path::PathSegment;

use super::{Segment, VectorPath};
use crate::error::Result;
use crate::types::{Color, Point, Rgb};

/// Parse SVG bytes into vector paths, in document order.
pub fn load_svg(data: &[u8]) -> Result<Vec<VectorPath>> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;

    let mut paths = Vec::new();
    collect_group(tree.root(), &mut paths);

    tracing::debug!(
        paths = paths.len(),
        width = tree.size().width(),
        height = tree.size().height(),
        "svg parsed"
    );
    Ok(paths)
}

/// Read and parse an SVG file.
pub fn load_svg_file<P: AsRef<Path>>(path: P) -> Result<Vec<VectorPath>> {
    let data = std::fs::read(path)?;
    load_svg(&data)
}

fn collect_group(group: &usvg::Group, out: &mut Vec<VectorPath>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(g) => collect_group(g, out),
            usvg::Node::Path(path) => {
                if let Some(vp) = convert_path(path) {
                    out.push(vp);
                }
            }
            usvg::Node::Image(_) => {}
            usvg::Node::Text(_) => {}
        }
    }
}

fn convert_path(path: &usvg::Path) -> Option<VectorPath> {
    let ts = path.abs_transform();
    let map = |pt: usvg::tiny_skia_path::Point| {
        let (x, y) = (f64::from(pt.x), f64::from(pt.y));
        Point::new(
            f64::from(ts.sx) * x + f64::from(ts.kx) * y + f64::from(ts.tx),
            f64::from(ts.ky) * x + f64::from(ts.sy) * y + f64::from(ts.ty),
        )
    };

    let segments: Vec<Segment> = path
        .data()
        .segments()
        .map(|seg| match seg {
            PathSegment::MoveTo(pt) => Segment::MoveTo(map(pt)),
            PathSegment::LineTo(pt) => Segment::LineTo(map(pt)),
            PathSegment::QuadTo(pt1, pt2) => Segment::QuadTo(map(pt1), map(pt2)),
            PathSegment::CubicTo(pt1, pt2, pt3) => {
                Segment::CubicTo(map(pt1), map(pt2), map(pt3))
            }
            PathSegment::Close => Segment::Close,
        })
        .collect();

    if segments.is_empty() {
        return None;
    }

    let paint = path
        .stroke()
        .map(|s| s.paint())
        .or_else(|| path.fill().map(|f| f.paint()));
    let color = match paint {
        Some(usvg::Paint::Color(c)) => Some(Color::Rgb(Rgb::new(c.red, c.green, c.blue))),
        _ => None,
    };

    Some(VectorPath { segments, color })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::flatten;

    #[test]
    fn test_polyline_with_stroke_color() {
        let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
            <polyline points="10,10 90,10 90,90" fill="none" stroke="#ff0000"/>
        </svg>"##;
        let paths = load_svg(svg).unwrap();

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].color, Some(Color::Rgb(Rgb::new(255, 0, 0))));
        let flat = flatten(&paths[0], 0.25);
        assert_eq!(flat.len(), 1);
        assert!(!flat[0].closed);
        assert_eq!(flat[0].points[0], Point::new(10.0, 10.0));
        assert_eq!(*flat[0].points.last().unwrap(), Point::new(90.0, 90.0));
    }

    #[test]
    fn test_group_transform_is_applied() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
            <g transform="translate(5 7)">
                <rect x="0" y="0" width="10" height="10" stroke="black" fill="none"/>
            </g>
        </svg>"#;
        let paths = load_svg(svg).unwrap();
        let flat = flatten(&paths[0], 0.25);

        assert!(flat[0].closed);
        let bounds = flat[0].bounds();
        assert!((bounds.min_x - 5.0).abs() < 1e-4);
        assert!((bounds.min_y - 7.0).abs() < 1e-4);
        assert!((bounds.max_x - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_svg_is_an_error() {
        assert!(load_svg(b"<not svg").is_err());
    }

    #[test]
    fn test_empty_document_has_no_paths() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"></svg>"#;
        assert!(load_svg(svg).unwrap().is_empty());
    }
}

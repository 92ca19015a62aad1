//! Contour extraction: trace the borders of foreground regions.
//!
//! Suzuki-Abe border following over 8-connected foreground. Borders are
//! discovered in raster order (top-to-bottom, left-to-right), which fixes the
//! order of the returned [`PathSet`]. Every traced pixel is labelled with its
//! border number so no border is followed twice, and the labels also recover
//! the nesting tree: each contour records its enclosing contour as a
//! `parent` index, and hole borders are flagged with `hole`.

use crate::bitmap::BinaryImage;
use crate::error::{IldaError, Result};
use crate::types::{Path, PathSet, Point};

/// Neighbour offsets in counter-clockwise order (y grows downwards).
const NEIGHBOURS: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BorderKind {
    Outer,
    Hole,
}

#[derive(Debug, Clone, Copy)]
struct Border {
    kind: BorderKind,
    parent: Option<usize>,
}

/// Label grid with a one-pixel background frame around the image.
struct Labels {
    width: usize,
    cells: Vec<i32>,
}

impl Labels {
    fn new(image: &BinaryImage, threshold: u8) -> Self {
        let w = image.width() as usize;
        let h = image.height() as usize;
        let width = w + 2;
        let mut cells = vec![0i32; width * (h + 2)];

        for y in 0..h {
            for x in 0..w {
                if image.is_foreground(x as u32, y as u32, threshold) {
                    cells[(y + 1) * width + x + 1] = 1;
                }
            }
        }

        Self { width, cells }
    }

    fn get(&self, (x, y): (usize, usize)) -> i32 {
        self.cells[y * self.width + x]
    }

    fn set(&mut self, (x, y): (usize, usize), value: i32) {
        self.cells[y * self.width + x] = value;
    }
}

fn step((x, y): (usize, usize), dir: usize) -> (usize, usize) {
    let (dx, dy) = NEIGHBOURS[dir];
    (x.wrapping_add_signed(dx), y.wrapping_add_signed(dy))
}

/// Direction index of `to` as seen from its neighbour `from`.
fn direction(from: (usize, usize), to: (usize, usize)) -> usize {
    let dx = to.0 as isize - from.0 as isize;
    let dy = to.1 as isize - from.1 as isize;
    match (dx, dy) {
        (1, 0) => 0,
        (1, -1) => 1,
        (0, -1) => 2,
        (-1, -1) => 3,
        (-1, 0) => 4,
        (-1, 1) => 5,
        (0, 1) => 6,
        _ => 7,
    }
}

/// Extract one closed path per border of every foreground region.
///
/// A pixel is foreground when its value is `>= threshold`. Isolated pixels
/// yield a one-point closed path.
pub fn extract_contours(image: &BinaryImage, threshold: u8) -> Result<PathSet> {
    let w = image.width() as usize;
    let h = image.height() as usize;
    if w == 0 || h == 0 {
        return Err(IldaError::InvalidImage(format!(
            "image has zero pixels ({}x{})",
            w, h
        )));
    }

    let mut labels = Labels::new(image, threshold);
    // Border number n is stored at index n - 2; 1 is the image frame.
    let mut borders: Vec<Border> = Vec::new();
    let mut paths = PathSet::new();
    let mut nbd: i32 = 1;

    for y in 1..=h {
        let mut lnbd: i32 = 1;

        for x in 1..=w {
            let value = labels.get((x, y));
            if value == 0 {
                continue;
            }

            let start = if value == 1 && labels.get((x - 1, y)) == 0 {
                Some((BorderKind::Outer, (x - 1, y)))
            } else if value >= 1 && labels.get((x + 1, y)) == 0 {
                if value > 1 {
                    lnbd = value;
                }
                Some((BorderKind::Hole, (x + 1, y)))
            } else {
                None
            };

            if let Some((kind, from)) = start {
                nbd += 1;
                let parent = enclosing_border(kind, lnbd, &borders);
                let pixels = follow_border(&mut labels, (x, y), from, nbd);

                borders.push(Border { kind, parent });
                paths.push(Path {
                    points: pixels
                        .into_iter()
                        .map(|(px, py)| Point::new((px - 1) as f64, (py - 1) as f64))
                        .collect(),
                    closed: true,
                    hole: kind == BorderKind::Hole,
                    parent,
                    color: None,
                });
            }

            let value = labels.get((x, y));
            if value != 1 {
                lnbd = value.abs();
            }
        }
    }

    tracing::debug!(
        contours = paths.len(),
        holes = paths.iter().filter(|p| p.hole).count(),
        points = paths.point_count(),
        "contours traced"
    );

    Ok(paths)
}

/// Parent of a newly found border, from the last border crossed on this row.
fn enclosing_border(kind: BorderKind, lnbd: i32, borders: &[Border]) -> Option<usize> {
    if lnbd <= 1 {
        return None;
    }

    let idx = (lnbd - 2) as usize;
    let last = borders.get(idx)?;
    if last.kind == kind {
        last.parent
    } else {
        Some(idx)
    }
}

/// Follow one border starting at `start`, entered from background pixel `from`.
fn follow_border(
    labels: &mut Labels,
    start: (usize, usize),
    from: (usize, usize),
    nbd: i32,
) -> Vec<(usize, usize)> {
    // Clockwise search for the first non-zero neighbour.
    let from_dir = direction(start, from);
    let first = (0..8)
        .map(|k| step(start, (from_dir + 8 - k) % 8))
        .find(|&p| labels.get(p) != 0);

    let Some(first) = first else {
        labels.set(start, -nbd);
        return vec![start];
    };

    let mut pixels = Vec::new();
    let mut prev = first;
    let mut current = start;

    loop {
        // Counter-clockwise search, starting just after the previous pixel.
        let prev_dir = direction(current, prev);
        let mut east_is_background = false;
        let mut next = prev;
        for k in 1..=8 {
            let dir = (prev_dir + k) % 8;
            let candidate = step(current, dir);
            if labels.get(candidate) != 0 {
                next = candidate;
                break;
            }
            if dir == 0 {
                east_is_background = true;
            }
        }

        if east_is_background {
            labels.set(current, -nbd);
        } else if labels.get(current) == 1 {
            labels.set(current, nbd);
        }
        pixels.push(current);

        if next == start && current == first {
            break;
        }
        prev = current;
        current = next;
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_from_rows(rows: &[&str]) -> BinaryImage {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        BinaryImage::from_fn(width, height, |x, y| {
            rows[y as usize].as_bytes()[x as usize] == b'#'
        })
        .unwrap()
    }

    fn coords(path: &Path) -> Vec<(f64, f64)> {
        path.points.iter().map(|p| (p.x, p.y)).collect()
    }

    #[test]
    fn test_single_pixel_yields_one_point_path() {
        let img = image_from_rows(&["...", ".#.", "..."]);
        let paths = extract_contours(&img, 128).unwrap();

        assert_eq!(paths.len(), 1);
        let path = &paths.paths()[0];
        assert!(path.closed);
        assert!(!path.hole);
        assert_eq!(coords(path), vec![(1.0, 1.0)]);
    }

    #[test]
    fn test_empty_image_has_no_contours() {
        let img = image_from_rows(&["....", "...."]);
        assert!(extract_contours(&img, 128).unwrap().is_empty());
    }

    #[test]
    fn test_square_block_traces_its_corners() {
        let img = image_from_rows(&["....", ".##.", ".##.", "...."]);
        let paths = extract_contours(&img, 128).unwrap();

        assert_eq!(paths.len(), 1);
        assert_eq!(
            coords(&paths.paths()[0]),
            vec![(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)]
        );
    }

    #[test]
    fn test_ring_yields_outer_and_hole() {
        let img = image_from_rows(&[".....", ".###.", ".#.#.", ".###.", "....."]);
        let paths = extract_contours(&img, 128).unwrap();

        assert_eq!(paths.len(), 2);
        let outer = &paths.paths()[0];
        let hole = &paths.paths()[1];
        assert!(!outer.hole);
        assert_eq!(outer.parent, None);
        assert!(hole.hole);
        assert_eq!(hole.parent, Some(0));
    }

    #[test]
    fn test_island_inside_hole_nests_under_hole() {
        let img = image_from_rows(&[
            ".......",
            ".#####.",
            ".#...#.",
            ".#.#.#.",
            ".#...#.",
            ".#####.",
            ".......",
        ]);
        let paths = extract_contours(&img, 128).unwrap();

        assert_eq!(paths.len(), 3);
        assert_eq!(paths.paths()[1].parent, Some(0));
        assert!(paths.paths()[1].hole);
        let island = &paths.paths()[2];
        assert!(!island.hole);
        assert_eq!(island.parent, Some(1));
        assert_eq!(coords(island), vec![(3.0, 3.0)]);
    }

    #[test]
    fn test_diagonal_pixels_are_one_region() {
        let img = image_from_rows(&["#..", ".#.", "..#"]);
        let paths = extract_contours(&img, 128).unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_regions_are_ordered_by_raster_scan() {
        let img = image_from_rows(&["...#", "....", "#..."]);
        let paths = extract_contours(&img, 128).unwrap();

        assert_eq!(paths.len(), 2);
        assert_eq!(coords(&paths.paths()[0]), vec![(3.0, 0.0)]);
        assert_eq!(coords(&paths.paths()[1]), vec![(0.0, 2.0)]);
    }

    #[test]
    fn test_threshold_selects_foreground() {
        let img = BinaryImage::new(3, 1, vec![10, 200, 90]).unwrap();
        assert_eq!(extract_contours(&img, 128).unwrap().len(), 1);
        assert_eq!(extract_contours(&img, 50).unwrap().len(), 1);
        assert_eq!(extract_contours(&img, 5).unwrap().point_count(), 3 + 1);
    }
}

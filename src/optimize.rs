//! Path ordering and blanking decisions.
//!
//! Each [`OrdererKind`] variant receives an **unordered** [`PathSet`] and
//! returns every path exactly once, in traversal order, with the direction
//! it should be drawn in. Blanking is decided afterwards from the resulting
//! pen jumps, so new strategies only have to care about order.
//!
//! The default nearest-neighbor strategy is a greedy approximation of an
//! open travelling-salesman tour over path endpoints. It is not optimal; a
//! 2-opt pass or similar can be added as another variant.

use std::fmt;
use std::str::FromStr;

use crate::config::PipelineConfig;
use crate::error::{IldaError, Result, Stage};
use crate::types::{Path, PathSet, Point};

/// A path placed in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedPath {
    /// Points in drawing order (already reversed when `reversed` is set)
    pub path: Path,
    /// Index of the path in the unordered input set
    pub source_index: usize,
    pub reversed: bool,
    /// Travel into this path happens with the laser off
    pub leading_blank: bool,
}

/// Selects which ordering strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrdererKind {
    /// Greedy nearest endpoint from the current pen position.
    ///
    /// Starts with the first path as given, then repeatedly picks the
    /// unvisited path whose nearer endpoint is closest to the pen (lowest
    /// input index on ties), reversing it when its last point is the
    /// nearer one.
    #[default]
    NearestNeighbor,

    /// Paths in input order, never reversed.
    InsertionOrder,
}

/// Strategy interface: order every path of the set exactly once.
///
/// Implementations only decide order and direction; `leading_blank` is
/// overwritten afterwards by [`mark_transitions`].
pub trait PathOrderer {
    fn order(&self, paths: PathSet) -> Vec<OrderedPath>;

    /// Short label used in logs.
    fn name(&self) -> &str {
        "custom"
    }
}

impl PathOrderer for OrdererKind {
    fn order(&self, paths: PathSet) -> Vec<OrderedPath> {
        match *self {
            Self::NearestNeighbor => order_nearest(paths),
            Self::InsertionOrder => order_insertion(paths),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::NearestNeighbor => "nearest",
            Self::InsertionOrder => "insertion",
        }
    }
}

impl fmt::Display for OrdererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OrdererKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "nearest" | "nearest-neighbor" => Ok(Self::NearestNeighbor),
            "insertion" | "insertion-order" => Ok(Self::InsertionOrder),
            other => Err(format!(
                "unknown orderer '{}' (expected 'nearest' or 'insertion')",
                other
            )),
        }
    }
}

/// Order the set with the configured strategy and mark blanked transitions.
///
/// An empty set yields an empty sequence.
pub fn order_paths(paths: PathSet, config: &PipelineConfig) -> Result<Vec<OrderedPath>> {
    order_paths_with(&config.orderer, paths, config.max_unblanked_jump)
}

/// Order the set with any strategy and mark blanked transitions.
///
/// Fails when the strategy does not return every input path exactly once.
pub fn order_paths_with(
    orderer: &dyn PathOrderer,
    paths: PathSet,
    max_unblanked_jump: Option<f64>,
) -> Result<Vec<OrderedPath>> {
    let count = paths.len();
    let mut ordered = orderer.order(paths);
    check_permutation(&ordered, count)?;

    mark_transitions(&mut ordered, max_unblanked_jump);

    tracing::debug!(
        strategy = orderer.name(),
        paths = ordered.len(),
        reversed = ordered.iter().filter(|o| o.reversed).count(),
        blanked = ordered.iter().filter(|o| o.leading_blank).count(),
        travel = travel_distance(&ordered),
        "paths ordered"
    );
    Ok(ordered)
}

fn check_permutation(ordered: &[OrderedPath], count: usize) -> Result<()> {
    let fail = |reason: String| IldaError::geometry(Stage::PathOptimizer, None, reason);

    if ordered.len() != count {
        return Err(fail(format!(
            "orderer returned {} paths for {} inputs",
            ordered.len(),
            count
        )));
    }
    let mut seen = vec![false; count];
    for o in ordered {
        match seen.get_mut(o.source_index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(fail(format!(
                    "orderer returned source index {} twice or out of range",
                    o.source_index
                )));
            }
        }
    }
    Ok(())
}

/// Decide which transitions travel with the laser off.
///
/// The first path never needs one. Without a jump limit every later
/// transition is blanked; with one, only jumps longer than the limit are.
pub fn mark_transitions(ordered: &mut [OrderedPath], max_unblanked_jump: Option<f64>) {
    let mut pen: Option<Point> = None;

    for entry in ordered.iter_mut() {
        entry.leading_blank = match (pen, entry.path.first()) {
            (Some(from), Some(to)) => match max_unblanked_jump {
                Some(limit) => from.distance(to) > limit,
                None => true,
            },
            _ => false,
        };
        if let Some(exit) = entry.path.exit_point() {
            pen = Some(*exit);
        }
    }
}

/// Total pen travel between consecutive paths (drawing excluded).
pub fn travel_distance(ordered: &[OrderedPath]) -> f64 {
    ordered
        .windows(2)
        .filter_map(|w| {
            let from = w[0].path.exit_point()?;
            let to = w[1].path.first()?;
            Some(from.distance(to))
        })
        .sum()
}

fn order_insertion(paths: PathSet) -> Vec<OrderedPath> {
    paths
        .into_iter()
        .enumerate()
        .map(|(source_index, path)| OrderedPath {
            path,
            source_index,
            reversed: false,
            leading_blank: false,
        })
        .collect()
}

fn order_nearest(paths: PathSet) -> Vec<OrderedPath> {
    let mut remaining: Vec<Option<Path>> = paths.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(remaining.len());

    let Some(first) = remaining.first_mut().and_then(Option::take) else {
        return ordered;
    };
    let mut pen = first.exit_point().copied();
    ordered.push(OrderedPath {
        path: first,
        source_index: 0,
        reversed: false,
        leading_blank: false,
    });

    while ordered.len() < remaining.len() {
        let mut best: Option<(usize, f64, bool)> = None;

        for (i, slot) in remaining.iter().enumerate() {
            let Some(path) = slot else { continue };
            let to_first = entry_distance(pen, path.first());
            let to_last = entry_distance(pen, path.last());
            let (dist, reverse) = if to_last < to_first {
                (to_last, true)
            } else {
                (to_first, false)
            };

            if best.is_none_or(|(_, best_dist, _)| dist < best_dist) {
                best = Some((i, dist, reverse));
            }
        }

        let Some((index, _, reverse)) = best else {
            break;
        };
        let Some(mut path) = remaining[index].take() else {
            break;
        };
        if reverse {
            path.reverse();
        }
        if let Some(exit) = path.exit_point() {
            pen = Some(*exit);
        }

        ordered.push(OrderedPath {
            path,
            source_index: index,
            reversed: reverse,
            leading_blank: false,
        });
    }

    ordered
}

fn entry_distance(pen: Option<Point>, target: Option<&Point>) -> f64 {
    match (pen, target) {
        (Some(pen), Some(target)) => pen.distance(target),
        (None, Some(_)) => 0.0,
        (_, None) => f64::INFINITY,
    }
}

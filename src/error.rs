//! Error taxonomy shared by every pipeline stage.

use std::fmt;

use thiserror::Error;

/// Pipeline stage that raised an error or diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ContourExtractor,
    CurveSimplifier,
    PathNormalizer,
    PathOptimizer,
    CoordinateMapper,
    FrameBuilder,
    IldaEncoder,
    IldaDecoder,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ContourExtractor => "contour extractor",
            Stage::CurveSimplifier => "curve simplifier",
            Stage::PathNormalizer => "path normalizer",
            Stage::PathOptimizer => "path optimizer",
            Stage::CoordinateMapper => "coordinate mapper",
            Stage::FrameBuilder => "frame builder",
            Stage::IldaEncoder => "ILDA encoder",
            Stage::IldaDecoder => "ILDA decoder",
        })
    }
}

/// Errors that can occur while converting artwork to ILDA.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IldaError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("unsupported ILDA format code {0} (expected one of 0, 1, 2, 4, 5)")]
    UnsupportedFormat(u8),

    #[error("{stage}: {reason}{}", at_index(.index))]
    Geometry {
        stage: Stage,
        index: Option<usize>,
        reason: String,
    },

    #[error("{field} does not fit its serialized width: {context}")]
    EncodingOverflow { field: &'static str, context: String },

    #[error("no frames to encode")]
    EmptyFrame,

    #[error("frame {frame}: {reason}")]
    InconsistentFrames { frame: usize, reason: String },

    #[error("frame {frame}, point {point}: color cannot be resolved for this format")]
    UnresolvedColor { frame: usize, point: usize },

    #[error("malformed ILDA data at byte {offset}: {reason}")]
    Decode { offset: usize, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("failed to parse SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn at_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" (path {})", i),
        None => String::new(),
    }
}

impl IldaError {
    pub(crate) fn geometry(stage: Stage, index: Option<usize>, reason: impl Into<String>) -> Self {
        IldaError::Geometry {
            stage,
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(field: &'static str, context: impl Into<String>) -> Self {
        IldaError::EncodingOverflow {
            field,
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IldaError>;

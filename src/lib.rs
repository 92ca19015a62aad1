//! # ilda-tools
//!
//! A Rust library for turning raster and vector artwork into ILDA laser
//! show files.
//!
//! ## Features
//!
//! - **Contour tracing**: Suzuki-Abe border following on binary images
//! - **Vector input**: SVG documents and hand-built paths, curves flattened
//! - **Path optimization**: Douglas-Peucker simplification, nearest-neighbour
//!   ordering and blanking of the travel between paths
//! - **ILDA I/O**: encoder and decoder for formats 0, 1, 2, 4 and 5
//!
//! ## Example - Image Conversion
//!
//! ```rust,ignore
//! use ilda_tools::{Pipeline, PipelineConfig, load_binary_image};
//!
//! let image = load_binary_image("logo.png", false).unwrap();
//! let config = PipelineConfig::default();
//! let conversion = Pipeline::new(&config).with_image(&image).run().unwrap();
//! conversion.write_to("logo.ild").unwrap();
//! ```
//!
//! ## Example - SVG Conversion
//!
//! ```rust,ignore
//! use ilda_tools::{FormatCode, Pipeline, PipelineConfig, load_svg_file};
//!
//! let vectors = load_svg_file("drawing.svg").unwrap();
//! let config = PipelineConfig {
//!     format: FormatCode::TrueColor2d,
//!     ..Default::default()
//! };
//! let conversion = Pipeline::new(&config).with_vectors(vectors).run().unwrap();
//! std::fs::write("drawing.ild", conversion.to_bytes().unwrap()).unwrap();
//! ```

pub mod bitmap;
pub mod bounds;
pub mod config;
pub mod contour;
pub mod diagnostics;
pub mod error;
pub mod ilda;
pub mod mapper;
pub mod normalize;
pub mod optimize;
pub mod pipeline;
pub mod simplify;
pub mod types;
pub mod vector;

// Re-export commonly used items
pub use bitmap::{BinaryImage, decode_binary_image, load_binary_image};
pub use bounds::Bounds;
pub use config::PipelineConfig;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{IldaError, Result, Stage};
pub use ilda::{FormatCode, Frame, IldaFile, Palette, ScanPoint, decode, encode};
pub use optimize::{OrdererKind, PathOrderer};
pub use pipeline::{Conversion, Pipeline, write_atomic};
pub use types::{Color, Path, PathSet, Point, Rgb, XForm};
pub use vector::svg::{load_svg, load_svg_file};
pub use vector::{Segment, VectorPath, YAxis};

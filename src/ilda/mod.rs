//! ILDA Image Data Transfer Format (IDTF rev. 011)
//!
//! This module holds the file model (palette + frames of point records),
//! the frame builder that turns mapped paths into point records, and the
//! binary encoder and decoder.

pub mod decode;
pub mod encode;
pub mod format;
pub mod frame;
pub mod palette;

pub use decode::decode;
pub use encode::encode;
pub use format::FormatCode;
pub use frame::{Frame, IldaFile, ScanPoint, build_frame};
pub use palette::Palette;

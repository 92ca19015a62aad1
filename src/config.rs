use crate::bounds::Bounds;
use crate::error::{IldaError, Result};
use crate::ilda::format::{FormatCode, check_name};
use crate::optimize::OrdererKind;
use crate::types::{Color, Rgb};
use crate::vector::YAxis;

/// All conversion parameters in one struct.
/// Threaded by reference into every stage; nothing is read from globals.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    // -- Contour stage --
    /// Foreground test for image input: `value >= threshold`.
    pub threshold: u8,

    // -- Simplification --
    /// Maximum deviation allowed by Douglas-Peucker, in source units.
    /// `None` uses 0.1% of the source diagonal. 0 disables simplification.
    pub simplify_epsilon: Option<f64>,

    // -- Vector input --
    /// Maximum distance between a curve and its flattened polyline.
    pub flatten_tolerance: f64,
    /// Y direction of supplied vector coordinates. SVG is `Down`.
    pub vector_y_axis: YAxis,

    // -- Ordering --
    pub orderer: OrdererKind,
    /// Longest travel drawn with the laser on. `None` blanks every transition.
    pub max_unblanked_jump: Option<f64>,

    // -- Mapping --
    /// Source box mapped onto the ILDA range. `None` uses the tight bounds.
    pub source_bounds: Option<Bounds>,
    /// Fraction of the signed 16-bit span to fill, in (0, 1].
    pub scale_margin: f64,
    /// Depth given to 2D input when a 3D format is written.
    pub z: f64,

    // -- Output --
    /// Format code 2 writes a palette section followed by format 1 frames.
    pub format: FormatCode,
    pub frame_name: String,
    pub company_name: String,
    /// Color of paths the caller left uncolored.
    /// If None, palette index 0 for indexed formats and white otherwise.
    pub default_color: Option<Color>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: 128,
            simplify_epsilon: None,
            flatten_tolerance: 0.25,
            vector_y_axis: YAxis::Down,
            orderer: OrdererKind::NearestNeighbor,
            max_unblanked_jump: None,
            source_bounds: None,
            scale_margin: 1.0,
            z: 0.0,
            format: FormatCode::Indexed2d,
            frame_name: "Frame000".to_string(),
            company_name: "ILDA".to_string(),
            default_color: None,
        }
    }
}

/// Fraction of the source diagonal used when no epsilon is configured.
pub const DEFAULT_EPSILON_RATIO: f64 = 0.001;

impl PipelineConfig {
    /// Reject option values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if let Some(eps) = self.simplify_epsilon
            && !(eps.is_finite() && eps >= 0.0)
        {
            return Err(IldaError::InvalidConfig(format!(
                "simplify_epsilon must be a finite value >= 0, got {}",
                eps
            )));
        }

        if !(self.flatten_tolerance.is_finite() && self.flatten_tolerance > 0.0) {
            return Err(IldaError::InvalidConfig(format!(
                "flatten_tolerance must be > 0, got {}",
                self.flatten_tolerance
            )));
        }

        if let Some(jump) = self.max_unblanked_jump
            && !(jump.is_finite() && jump > 0.0)
        {
            return Err(IldaError::InvalidConfig(format!(
                "max_unblanked_jump must be > 0 when set, got {}",
                jump
            )));
        }

        if let Some(bounds) = self.source_bounds
            && !bounds.is_valid()
        {
            return Err(IldaError::InvalidConfig(format!(
                "source_bounds is not a valid box: {:?}",
                bounds
            )));
        }

        if !(self.scale_margin > 0.0 && self.scale_margin <= 1.0) {
            return Err(IldaError::InvalidConfig(format!(
                "scale_margin must be in (0, 1], got {}",
                self.scale_margin
            )));
        }

        if !self.z.is_finite() {
            return Err(IldaError::InvalidConfig("z must be finite".to_string()));
        }

        if let (FormatCode::Palette, Some(Color::Indexed(i))) = (self.format, self.default_color) {
            return Err(IldaError::InvalidConfig(format!(
                "default_color must be RGB for the palette format, got index {}",
                i
            )));
        }

        check_name("frame_name", &self.frame_name)?;
        check_name("company_name", &self.company_name)?;
        Ok(())
    }

    /// Simplification tolerance for a source of the given diagonal.
    pub fn epsilon_for(&self, diagonal: f64) -> f64 {
        self.simplify_epsilon
            .unwrap_or(diagonal * DEFAULT_EPSILON_RATIO)
    }

    /// Format code of the point sections actually written.
    pub fn frame_format(&self) -> FormatCode {
        match self.format {
            FormatCode::Palette => FormatCode::Indexed2d,
            other => other,
        }
    }

    /// Color given to paths without a caller-assigned one.
    pub fn fallback_color(&self) -> Color {
        self.default_color.unwrap_or(match self.format {
            FormatCode::Indexed3d | FormatCode::Indexed2d => Color::Indexed(0),
            FormatCode::Palette | FormatCode::TrueColor3d | FormatCode::TrueColor2d => {
                Color::Rgb(Rgb::WHITE)
            }
        })
    }
}

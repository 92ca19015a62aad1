//! Record layout constants for ILDA IDTF rev. 011

use std::fmt;

use crate::error::{IldaError, Result};

/// Magic bytes opening every section header
pub const MAGIC: &[u8; 4] = b"ILDA";

/// Fixed size of a section header in bytes
pub const HEADER_LEN: usize = 32;

/// Width of the name and company fields
pub const NAME_LEN: usize = 8;

/// Status bit marking the final record of a frame
pub const STATUS_LAST_POINT: u8 = 0x80;

/// Status bit marking a laser-off record
pub const STATUS_BLANKED: u8 = 0x40;

/// Largest coordinate magnitude the mapper emits
pub const COORD_MAX: i16 = 32767;

/// Section format code (header byte 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatCode {
    /// 3D coordinates, palette index
    Indexed3d,
    /// 2D coordinates, palette index
    #[default]
    Indexed2d,
    /// Color palette section
    Palette,
    /// 3D coordinates, inline BGR
    TrueColor3d,
    /// 2D coordinates, inline BGR
    TrueColor2d,
}

impl FormatCode {
    pub const ALL: [FormatCode; 5] = [
        FormatCode::Indexed3d,
        FormatCode::Indexed2d,
        FormatCode::Palette,
        FormatCode::TrueColor3d,
        FormatCode::TrueColor2d,
    ];

    pub fn code(self) -> u8 {
        match self {
            FormatCode::Indexed3d => 0,
            FormatCode::Indexed2d => 1,
            FormatCode::Palette => 2,
            FormatCode::TrueColor3d => 4,
            FormatCode::TrueColor2d => 5,
        }
    }

    /// Size of one record following a header of this format.
    pub fn record_len(self) -> usize {
        match self {
            FormatCode::Indexed3d => 8,
            FormatCode::Indexed2d => 6,
            FormatCode::Palette => 3,
            FormatCode::TrueColor3d => 10,
            FormatCode::TrueColor2d => 8,
        }
    }

    pub fn is_3d(self) -> bool {
        matches!(self, FormatCode::Indexed3d | FormatCode::TrueColor3d)
    }

    pub fn is_true_color(self) -> bool {
        matches!(self, FormatCode::TrueColor3d | FormatCode::TrueColor2d)
    }

    /// Whether this section carries point records rather than palette entries.
    pub fn is_frame(self) -> bool {
        self != FormatCode::Palette
    }
}

impl TryFrom<u8> for FormatCode {
    type Error = IldaError;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        FormatCode::ALL
            .into_iter()
            .find(|f| f.code() == code)
            .ok_or(IldaError::UnsupportedFormat(code))
    }
}

impl fmt::Display for FormatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Reject a header string that does not fit its fixed-width field.
pub(crate) fn check_name(field: &'static str, value: &str) -> Result<()> {
    if value.len() > NAME_LEN {
        return Err(IldaError::overflow(
            field,
            format!("{:?} is {} bytes, limit is {}", value, value.len(), NAME_LEN),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_codes() {
        for code in [0u8, 1, 2, 4, 5] {
            assert_eq!(FormatCode::try_from(code).unwrap().code(), code);
        }
    }

    #[test]
    fn test_code_3_is_unsupported() {
        assert!(matches!(
            FormatCode::try_from(3),
            Err(IldaError::UnsupportedFormat(3))
        ));
        assert!(FormatCode::try_from(6).is_err());
    }

    #[test]
    fn test_record_lengths() {
        assert_eq!(FormatCode::Indexed3d.record_len(), 8);
        assert_eq!(FormatCode::Indexed2d.record_len(), 6);
        assert_eq!(FormatCode::TrueColor3d.record_len(), 10);
        assert_eq!(FormatCode::TrueColor2d.record_len(), 8);
        assert!(!FormatCode::Palette.is_frame());
    }
}

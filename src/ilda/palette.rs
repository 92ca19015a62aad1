//! Color palette sections and color resolution per record format.

use std::collections::HashSet;

use crate::error::{IldaError, Result};
use crate::ilda::format::FormatCode;
use crate::types::{Color, Rgb};

/// Most entries a palette section can index with one byte.
pub const MAX_PALETTE_LEN: usize = 256;

/// A format 2 section: indexed colors for the frames that follow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    pub name: String,
    pub company: String,
    /// Palette number written in the header's frame-number field
    pub number: u16,
    pub projector: u8,
    pub colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self {
            colors,
            ..Default::default()
        }
    }

    /// Palette of the distinct colors in `colors`, in first-use order.
    pub fn from_colors<I>(colors: I) -> Result<Self>
    where
        I: IntoIterator<Item = Rgb>,
    {
        let mut seen: HashSet<Rgb> = HashSet::new();
        let mut distinct = Vec::new();
        for rgb in colors {
            if seen.insert(rgb) {
                distinct.push(rgb);
            }
        }

        if distinct.len() > MAX_PALETTE_LEN {
            return Err(IldaError::overflow(
                "palette",
                format!(
                    "{} distinct colors, limit is {}",
                    distinct.len(),
                    MAX_PALETTE_LEN
                ),
            ));
        }
        Ok(Self::new(distinct))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.colors.get(usize::from(index)).copied()
    }

    /// Index of the first entry exactly equal to `rgb`.
    pub fn index_of(&self, rgb: Rgb) -> Option<u8> {
        self.colors
            .iter()
            .position(|&c| c == rgb)
            .and_then(|i| u8::try_from(i).ok())
    }
}

/// Express `color` the way records of `format` store it.
///
/// Indexed formats keep indices and look RGB values up in the palette by
/// exact match; true-color formats keep RGB and expand indices through the
/// palette. With a palette present, indices must point into it. `None` when
/// the palette cannot bridge the two.
pub fn resolve(color: Color, format: FormatCode, palette: Option<&Palette>) -> Option<Color> {
    match (format.is_true_color(), color) {
        (true, Color::Rgb(_)) => Some(color),
        (false, Color::Indexed(i)) => match palette {
            Some(p) if usize::from(i) >= p.len() => None,
            _ => Some(color),
        },
        (true, Color::Indexed(i)) => palette?.get(i).map(Color::Rgb),
        (false, Color::Rgb(rgb)) => palette?.index_of(rgb).map(Color::Indexed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);

    #[test]
    fn test_from_colors_keeps_first_use_order() {
        let p = Palette::from_colors([GREEN, RED, GREEN, RED]).unwrap();
        assert_eq!(p.colors, vec![GREEN, RED]);
        assert_eq!(p.index_of(RED), Some(1));
    }

    #[test]
    fn test_too_many_colors_overflow() {
        let colors = (0..=256u32).map(|i| Rgb::new((i % 256) as u8, (i / 256) as u8, 0));
        assert!(matches!(
            Palette::from_colors(colors),
            Err(IldaError::EncodingOverflow { field: "palette", .. })
        ));
    }

    #[test]
    fn test_resolve_per_format() {
        let p = Palette::new(vec![RED, GREEN]);
        let indexed = FormatCode::Indexed2d;
        let true_color = FormatCode::TrueColor2d;

        assert_eq!(resolve(Color::Indexed(9), indexed, None), Some(Color::Indexed(9)));
        assert_eq!(resolve(Color::Rgb(GREEN), indexed, Some(&p)), Some(Color::Indexed(1)));
        assert_eq!(resolve(Color::Rgb(GREEN), indexed, None), None);
        assert_eq!(resolve(Color::Indexed(0), true_color, Some(&p)), Some(Color::Rgb(RED)));
        assert_eq!(resolve(Color::Indexed(5), true_color, Some(&p)), None);
        assert_eq!(resolve(Color::Rgb(RED), true_color, None), Some(Color::Rgb(RED)));
    }

    #[test]
    fn test_index_must_point_into_palette() {
        let p = Palette::new(vec![RED, GREEN]);
        let indexed = FormatCode::Indexed2d;

        assert_eq!(resolve(Color::Indexed(1), indexed, Some(&p)), Some(Color::Indexed(1)));
        assert_eq!(resolve(Color::Indexed(2), indexed, Some(&p)), None);
        assert_eq!(resolve(Color::Indexed(0), indexed, Some(&Palette::new(vec![]))), None);
    }
}

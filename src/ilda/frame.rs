//! In-memory ILDA file model and frame materialization.

use crate::config::PipelineConfig;
use crate::error::{IldaError, Result};
use crate::ilda::format::FormatCode;
use crate::ilda::palette::{self, Palette};
use crate::mapper::{MappedPath, MappedPoint};
use crate::types::Color;

/// One point record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPoint {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub blanked: bool,
    pub color: Color,
}

impl ScanPoint {
    fn from_mapped(p: &MappedPoint, blanked: bool, color: Color) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
            blanked,
            color,
        }
    }
}

/// One frame section: header fields plus its point records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
    pub company: String,
    /// 0-indexed position of this frame in the file
    pub frame_number: u16,
    /// Number of frames in the file, repeated in every header
    pub total_frames: u16,
    pub format: FormatCode,
    pub projector: u8,
    pub points: Vec<ScanPoint>,
}

impl Frame {
    pub fn new(format: FormatCode, name: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            company: company.into(),
            frame_number: 0,
            total_frames: 1,
            format,
            projector: 0,
            points: Vec::new(),
        }
    }

    /// Split the point sequence into lit runs.
    ///
    /// Every blanked point ends the current run and opens the next one, so
    /// each run starts where the beam was parked before drawing.
    pub fn polylines(&self) -> Vec<Vec<ScanPoint>> {
        let mut runs: Vec<Vec<ScanPoint>> = Vec::new();
        let mut current: Vec<ScanPoint> = Vec::new();

        for p in &self.points {
            if p.blanked && !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            current.push(*p);
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

/// A complete ILDA file: an optional palette followed by frames.
///
/// The terminating zero-record header is not stored; the encoder always
/// writes it and the decoder stops at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IldaFile {
    pub palette: Option<Palette>,
    pub frames: Vec<Frame>,
}

impl IldaFile {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            palette: None,
            frames,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Number frames 0..K and set every `total_frames` to K.
    pub fn renumber(&mut self) -> Result<()> {
        let total = u16::try_from(self.frames.len()).map_err(|_| {
            IldaError::overflow("total frames", format!("{} frames", self.frames.len()))
        })?;
        for (number, frame) in (0..total).zip(self.frames.iter_mut()) {
            frame.frame_number = number;
            frame.total_frames = total;
        }
        Ok(())
    }

    /// Rewrite every point color in the form its frame's records store.
    pub fn resolve_colors(&mut self) -> Result<()> {
        let palette = self.palette.as_ref();
        for (fi, frame) in self.frames.iter_mut().enumerate() {
            for (pi, point) in frame.points.iter_mut().enumerate() {
                point.color = palette::resolve(point.color, frame.format, palette).ok_or(
                    IldaError::UnresolvedColor {
                        frame: fi,
                        point: pi,
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Lit runs of every frame, in file order.
    pub fn polylines(&self) -> Vec<Vec<ScanPoint>> {
        self.frames.iter().flat_map(Frame::polylines).collect()
    }

    pub fn point_count(&self) -> usize {
        self.frames.iter().map(|f| f.points.len()).sum()
    }
}

/// Materialize mapped paths into one frame.
///
/// Each path contributes a blanked point at its first coordinate when its
/// entry is blanked, then its own points, then (for closed paths of two or
/// more points) its first point again to draw the closing segment.
pub fn build_frame(paths: &[MappedPath], config: &PipelineConfig) -> Frame {
    let mut frame = Frame::new(
        config.frame_format(),
        config.frame_name.clone(),
        config.company_name.clone(),
    );
    let fallback = config.fallback_color();

    for path in paths {
        let color = path.color.unwrap_or(fallback);
        let Some(first) = path.points.first() else {
            continue;
        };

        if path.leading_blank {
            frame.points.push(ScanPoint::from_mapped(first, true, color));
        }
        frame.points.extend(
            path.points
                .iter()
                .map(|p| ScanPoint::from_mapped(p, p.blanked, color)),
        );
        if path.closed && path.points.len() >= 2 {
            frame
                .points
                .push(ScanPoint::from_mapped(first, first.blanked, color));
        }
    }

    tracing::debug!(
        paths = paths.len(),
        points = frame.points.len(),
        blanked = frame.points.iter().filter(|p| p.blanked).count(),
        "frame built"
    );
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    fn mapped(coords: &[(i16, i16)], closed: bool, leading_blank: bool) -> MappedPath {
        MappedPath {
            points: coords
                .iter()
                .map(|&(x, y)| MappedPoint {
                    x,
                    y,
                    z: 0,
                    blanked: false,
                })
                .collect(),
            closed,
            leading_blank,
            color: None,
            source_index: 0,
        }
    }

    fn point(x: i16, y: i16, blanked: bool) -> ScanPoint {
        ScanPoint {
            x,
            y,
            z: 0,
            blanked,
            color: Color::Indexed(0),
        }
    }

    #[test]
    fn test_closed_path_repeats_first_point() {
        let frame = build_frame(
            &[mapped(&[(0, 0), (10, 0), (10, 10)], true, false)],
            &PipelineConfig::default(),
        );
        let xy: Vec<(i16, i16)> = frame.points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(xy, vec![(0, 0), (10, 0), (10, 10), (0, 0)]);
    }

    #[test]
    fn test_single_point_path_is_not_repeated() {
        let frame = build_frame(&[mapped(&[(5, 5)], true, false)], &PipelineConfig::default());
        assert_eq!(frame.points, vec![point(5, 5, false)]);
    }

    #[test]
    fn test_leading_blank_inserts_one_point() {
        let frame = build_frame(
            &[
                mapped(&[(0, 0), (1, 0)], false, false),
                mapped(&[(100, 100), (101, 100)], false, true),
            ],
            &PipelineConfig::default(),
        );
        assert_eq!(
            frame.points,
            vec![
                point(0, 0, false),
                point(1, 0, false),
                point(100, 100, true),
                point(100, 100, false),
                point(101, 100, false),
            ]
        );
    }

    #[test]
    fn test_header_fields_come_from_config() {
        let config = PipelineConfig {
            frame_name: "logo".to_string(),
            company_name: "acme".to_string(),
            format: FormatCode::TrueColor3d,
            ..Default::default()
        };
        let frame = build_frame(&[mapped(&[(1, 1)], false, false)], &config);

        assert_eq!(frame.name, "logo");
        assert_eq!(frame.company, "acme");
        assert_eq!(frame.format, FormatCode::TrueColor3d);
        assert_eq!(frame.points[0].color, Color::Rgb(Rgb::WHITE));
    }

    #[test]
    fn test_polylines_split_at_blanks() {
        let mut frame = Frame::new(FormatCode::Indexed2d, "", "");
        frame.points = vec![
            point(0, 0, false),
            point(1, 0, false),
            point(50, 50, true),
            point(51, 50, false),
            point(90, 90, true),
        ];
        let runs = frame.polylines();

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 2);
        assert!(runs[1][0].blanked);
        assert_eq!(runs[2].len(), 1);
    }

    #[test]
    fn test_resolve_colors_reports_position() {
        let mut frame = Frame::new(FormatCode::Indexed2d, "", "");
        frame.points = vec![point(0, 0, false), point(1, 1, false)];
        frame.points[1].color = Color::Rgb(Rgb::new(1, 2, 3));
        let mut file = IldaFile::new(vec![frame]);

        assert!(matches!(
            file.resolve_colors(),
            Err(IldaError::UnresolvedColor { frame: 0, point: 1 })
        ));

        file.palette = Some(Palette::new(vec![Rgb::new(9, 9, 9), Rgb::new(1, 2, 3)]));
        file.resolve_colors().unwrap();
        assert_eq!(file.frames[0].points[1].color, Color::Indexed(1));
    }

    #[test]
    fn test_renumber_sets_totals() {
        let mut file = IldaFile::new(vec![
            Frame::new(FormatCode::Indexed2d, "a", ""),
            Frame::new(FormatCode::Indexed2d, "b", ""),
            Frame::new(FormatCode::Indexed2d, "c", ""),
        ]);
        file.renumber().unwrap();

        let numbers: Vec<(u16, u16)> = file
            .frames
            .iter()
            .map(|f| (f.frame_number, f.total_frames))
            .collect();
        assert_eq!(numbers, vec![(0, 3), (1, 3), (2, 3)]);
    }
}

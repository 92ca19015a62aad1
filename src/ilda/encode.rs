//! ILDA serialization.
//!
//! The whole file is checked before the first byte is produced: frame
//! numbering, header field widths and color resolvability. The output is one
//! buffer the caller commits in a single write.

use crate::error::{IldaError, Result};
use crate::ilda::format::{
    FormatCode, HEADER_LEN, MAGIC, NAME_LEN, STATUS_BLANKED, STATUS_LAST_POINT, check_name,
};
use crate::ilda::frame::{Frame, IldaFile, ScanPoint};
use crate::ilda::palette::{self, MAX_PALETTE_LEN, Palette};
use crate::types::Color;

/// Header fields shared by every section kind.
struct Header<'a> {
    format: FormatCode,
    name: &'a str,
    company: &'a str,
    records: u16,
    number: u16,
    total: u16,
    projector: u8,
}

/// Serialize a file, including the terminating header.
pub fn encode(file: &IldaFile) -> Result<Vec<u8>> {
    let total = validate(file)?;

    let mut out = Vec::with_capacity(encoded_len(file));

    if let Some(p) = &file.palette {
        write_header(
            &mut out,
            &Header {
                format: FormatCode::Palette,
                name: &p.name,
                company: &p.company,
                records: p.colors.len() as u16,
                number: p.number,
                total: 0,
                projector: p.projector,
            },
        );
        for c in &p.colors {
            out.extend_from_slice(&[c.r, c.g, c.b]);
        }
    }

    for (fi, frame) in file.frames.iter().enumerate() {
        write_header(
            &mut out,
            &Header {
                format: frame.format,
                name: &frame.name,
                company: &frame.company,
                records: frame.points.len() as u16,
                number: frame.frame_number,
                total: frame.total_frames,
                projector: frame.projector,
            },
        );

        let last = frame.points.len() - 1;
        for (pi, point) in frame.points.iter().enumerate() {
            let color = palette::resolve(point.color, frame.format, file.palette.as_ref())
                .ok_or(IldaError::UnresolvedColor {
                    frame: fi,
                    point: pi,
                })?;
            write_record(&mut out, frame.format, point, color, pi == last);
        }
    }

    // Terminator: zero records, numbered after the last frame.
    let last_format = file
        .frames
        .last()
        .map_or(FormatCode::Indexed2d, |f| f.format);
    write_header(
        &mut out,
        &Header {
            format: last_format,
            name: "",
            company: "",
            records: 0,
            number: total,
            total,
            projector: 0,
        },
    );

    tracing::debug!(
        frames = file.frames.len(),
        points = file.point_count(),
        bytes = out.len(),
        "ILDA encoded"
    );
    Ok(out)
}

/// Check every cross-record rule; returns the frame count.
fn validate(file: &IldaFile) -> Result<u16> {
    if file.frames.is_empty() {
        return Err(IldaError::EmptyFrame);
    }
    let total = u16::try_from(file.frames.len()).map_err(|_| {
        IldaError::overflow(
            "total frames",
            format!("{} frames, limit is {}", file.frames.len(), u16::MAX),
        )
    })?;

    if let Some(p) = &file.palette {
        validate_palette(p)?;
    }

    for (fi, frame) in file.frames.iter().enumerate() {
        validate_frame(fi, frame, total)?;

        for (pi, point) in frame.points.iter().enumerate() {
            if palette::resolve(point.color, frame.format, file.palette.as_ref()).is_none() {
                return Err(IldaError::UnresolvedColor {
                    frame: fi,
                    point: pi,
                });
            }
        }
    }

    Ok(total)
}

fn validate_palette(p: &Palette) -> Result<()> {
    if p.is_empty() {
        return Err(IldaError::overflow(
            "palette",
            "palette has no colors and would read as the end of the file",
        ));
    }
    if p.colors.len() > MAX_PALETTE_LEN {
        return Err(IldaError::overflow(
            "palette",
            format!("{} colors, limit is {}", p.colors.len(), MAX_PALETTE_LEN),
        ));
    }
    check_name("palette name", &p.name)?;
    check_name("palette company", &p.company)
}

fn validate_frame(index: usize, frame: &Frame, total: u16) -> Result<()> {
    let inconsistent = |reason: String| IldaError::InconsistentFrames {
        frame: index,
        reason,
    };

    if !frame.format.is_frame() {
        return Err(inconsistent(
            "frame sections cannot use the palette format".to_string(),
        ));
    }
    if frame.total_frames != total {
        return Err(inconsistent(format!(
            "header says {} total frames, file has {}",
            frame.total_frames, total
        )));
    }
    if usize::from(frame.frame_number) != index {
        return Err(inconsistent(format!(
            "frame number {} out of sequence, expected {}",
            frame.frame_number, index
        )));
    }
    if frame.points.is_empty() {
        return Err(inconsistent(
            "frame has no points and would read as the end of the file".to_string(),
        ));
    }
    if frame.points.len() > usize::from(u16::MAX) {
        return Err(IldaError::overflow(
            "record count",
            format!("frame {} has {} points, limit is {}", index, frame.points.len(), u16::MAX),
        ));
    }

    check_name("frame name", &frame.name)?;
    check_name("company name", &frame.company)
}

fn encoded_len(file: &IldaFile) -> usize {
    let palette = file.palette.as_ref().map_or(0, |p| {
        HEADER_LEN + p.colors.len() * FormatCode::Palette.record_len()
    });
    let frames: usize = file
        .frames
        .iter()
        .map(|f| HEADER_LEN + f.points.len() * f.format.record_len())
        .sum();
    palette + frames + HEADER_LEN
}

fn write_name(out: &mut Vec<u8>, value: &str) {
    let mut field = [0u8; NAME_LEN];
    let bytes = value.as_bytes();
    field[..bytes.len()].copy_from_slice(bytes);
    out.extend_from_slice(&field);
}

fn write_header(out: &mut Vec<u8>, h: &Header<'_>) {
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[0, 0, 0]);
    out.push(h.format.code());
    write_name(out, h.name);
    write_name(out, h.company);
    out.extend_from_slice(&h.records.to_be_bytes());
    out.extend_from_slice(&h.number.to_be_bytes());
    out.extend_from_slice(&h.total.to_be_bytes());
    out.push(h.projector);
    out.push(0);
}

fn write_record(out: &mut Vec<u8>, format: FormatCode, p: &ScanPoint, color: Color, last: bool) {
    let mut status = 0u8;
    if p.blanked {
        status |= STATUS_BLANKED;
    }
    if last {
        status |= STATUS_LAST_POINT;
    }

    out.extend_from_slice(&p.x.to_be_bytes());
    out.extend_from_slice(&p.y.to_be_bytes());
    if format.is_3d() {
        out.extend_from_slice(&p.z.to_be_bytes());
    }
    out.push(status);

    match color {
        Color::Indexed(i) => out.push(i),
        Color::Rgb(c) => out.extend_from_slice(&[c.b, c.g, c.r]),
    }
}

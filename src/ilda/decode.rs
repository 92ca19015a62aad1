//! ILDA parsing.
//!
//! Reads sections until the zero-record terminator (or the end of the data
//! when a writer left it out). Every error names the byte offset at which the
//! data stopped making sense.

use crate::error::{IldaError, Result};
use crate::ilda::format::{FormatCode, HEADER_LEN, MAGIC, NAME_LEN, STATUS_BLANKED};
use crate::ilda::frame::{Frame, IldaFile, ScanPoint};
use crate::ilda::palette::Palette;
use crate::types::{Color, Rgb};

struct RawHeader {
    format: FormatCode,
    name: String,
    company: String,
    records: u16,
    number: u16,
    total: u16,
    projector: u8,
}

fn decode_error(offset: usize, reason: impl Into<String>) -> IldaError {
    IldaError::Decode {
        offset,
        reason: reason.into(),
    }
}

fn be_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

fn be_i16(data: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([data[at], data[at + 1]])
}

fn read_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn read_header(data: &[u8], offset: usize) -> Result<RawHeader> {
    let Some(h) = data.get(offset..offset + HEADER_LEN) else {
        return Err(decode_error(
            offset,
            format!(
                "truncated header: {} bytes left, need {}",
                data.len() - offset,
                HEADER_LEN
            ),
        ));
    };

    if &h[0..4] != MAGIC {
        return Err(decode_error(offset, "missing \"ILDA\" magic"));
    }

    let format = FormatCode::try_from(h[7])
        .map_err(|_| decode_error(offset + 7, format!("unknown format code {}", h[7])))?;

    Ok(RawHeader {
        format,
        name: read_name(&h[8..8 + NAME_LEN]),
        company: read_name(&h[16..16 + NAME_LEN]),
        records: be_u16(h, 24),
        number: be_u16(h, 26),
        total: be_u16(h, 28),
        projector: h[30],
    })
}

fn read_point(rec: &[u8], format: FormatCode) -> ScanPoint {
    let x = be_i16(rec, 0);
    let y = be_i16(rec, 2);
    let (z, rest) = if format.is_3d() {
        (be_i16(rec, 4), &rec[6..])
    } else {
        (0, &rec[4..])
    };

    let status = rest[0];
    let color = if format.is_true_color() {
        Color::Rgb(Rgb::new(rest[3], rest[2], rest[1]))
    } else {
        Color::Indexed(rest[1])
    };

    ScanPoint {
        x,
        y,
        z,
        blanked: status & STATUS_BLANKED != 0,
        color,
    }
}

/// Parse a complete ILDA byte stream.
pub fn decode(data: &[u8]) -> Result<IldaFile> {
    if data.is_empty() {
        return Err(decode_error(0, "no data"));
    }

    let mut file = IldaFile::default();
    let mut offset = 0;

    while offset < data.len() {
        let header = read_header(data, offset)?;
        offset += HEADER_LEN;

        if header.records == 0 {
            if offset < data.len() {
                tracing::debug!(trailing = data.len() - offset, "bytes after terminator ignored");
            }
            break;
        }

        let record_len = header.format.record_len();
        let body_len = usize::from(header.records) * record_len;
        let Some(body) = data.get(offset..offset + body_len) else {
            return Err(decode_error(
                offset,
                format!(
                    "truncated section: {} records need {} bytes, {} left",
                    header.records,
                    body_len,
                    data.len() - offset
                ),
            ));
        };

        if header.format == FormatCode::Palette {
            if file.palette.is_some() {
                tracing::warn!(offset, "later palette section replaces an earlier one");
            }
            file.palette = Some(Palette {
                name: header.name,
                company: header.company,
                number: header.number,
                projector: header.projector,
                colors: body
                    .chunks_exact(record_len)
                    .map(|c| Rgb::new(c[0], c[1], c[2]))
                    .collect(),
            });
        } else {
            file.frames.push(Frame {
                name: header.name,
                company: header.company,
                frame_number: header.number,
                total_frames: header.total,
                format: header.format,
                projector: header.projector,
                points: body
                    .chunks_exact(record_len)
                    .map(|rec| read_point(rec, header.format))
                    .collect(),
            });
        }

        offset += body_len;
    }

    tracing::debug!(
        frames = file.frames.len(),
        points = file.point_count(),
        palette = file.palette.is_some(),
        "ILDA decoded"
    );
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilda::encode::encode;

    fn sample_file(format: FormatCode) -> IldaFile {
        let color = if format.is_true_color() {
            Color::Rgb(Rgb::new(200, 100, 50))
        } else {
            Color::Indexed(4)
        };
        let mut frame = Frame::new(format, "test", "me");
        frame.points = vec![
            ScanPoint {
                x: -32767,
                y: 32767,
                z: -5,
                blanked: false,
                color,
            },
            ScanPoint {
                x: 100,
                y: -100,
                z: 12,
                blanked: true,
                color,
            },
            ScanPoint {
                x: 100,
                y: -100,
                z: 12,
                blanked: false,
                color,
            },
        ];
        if !format.is_3d() {
            frame.points.iter_mut().for_each(|p| p.z = 0);
        }
        IldaFile::new(vec![frame])
    }

    #[test]
    fn test_round_trip_every_frame_format() {
        for format in [
            FormatCode::Indexed3d,
            FormatCode::Indexed2d,
            FormatCode::TrueColor3d,
            FormatCode::TrueColor2d,
        ] {
            let file = sample_file(format);
            let bytes = encode(&file).unwrap();
            let decoded = decode(&bytes).unwrap();

            assert_eq!(decoded, file, "format {}", format);
            assert_eq!(encode(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_palette_round_trip() {
        let mut file = sample_file(FormatCode::Indexed2d);
        file.palette = Some(Palette::new(vec![Rgb::new(1, 2, 3); 5]));
        let decoded = decode(&encode(&file).unwrap()).unwrap();
        assert_eq!(decoded, file);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample_file(FormatCode::Indexed2d)).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(IldaError::Decode { offset: 0, .. })));
    }

    #[test]
    fn test_truncated_body_reports_offset() {
        let bytes = encode(&sample_file(FormatCode::Indexed2d)).unwrap();
        let cut = &bytes[..32 + 8];
        assert!(matches!(decode(cut), Err(IldaError::Decode { offset: 32, .. })));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            decode(b"ILDA\0\0\0"),
            Err(IldaError::Decode { offset: 0, .. })
        ));
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn test_unknown_format_code() {
        let mut bytes = encode(&sample_file(FormatCode::Indexed2d)).unwrap();
        bytes[7] = 3;
        assert!(matches!(decode(&bytes), Err(IldaError::Decode { offset: 7, .. })));
    }

    #[test]
    fn test_missing_terminator_is_tolerated() {
        let bytes = encode(&sample_file(FormatCode::Indexed2d)).unwrap();
        let without = &bytes[..bytes.len() - 32];
        assert_eq!(decode(without).unwrap().frames[0].points.len(), 3);
    }

    #[test]
    fn test_last_point_bit_is_not_a_blank() {
        let bytes = encode(&sample_file(FormatCode::Indexed2d)).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert!(!decoded.frames[0].points[2].blanked);
    }
}

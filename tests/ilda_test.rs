//! Integration tests for the ILDA encoder and decoder
//!
//! Files are built by hand so the byte layout can be checked field by field.

use ilda_tools::{
    Color, FormatCode, Frame, IldaError, IldaFile, Palette, Pipeline, PipelineConfig, Rgb,
    ScanPoint, VectorPath, decode, encode,
};

const RED: Rgb = Rgb::new(255, 0, 0);
const BLUE: Rgb = Rgb::new(0, 0, 255);

// Helper to create a lit point
fn point(x: i16, y: i16, color: Color) -> ScanPoint {
    ScanPoint {
        x,
        y,
        z: 0,
        blanked: false,
        color,
    }
}

// Helper to create a frame from points
fn frame(format: FormatCode, points: Vec<ScanPoint>) -> Frame {
    let mut frame = Frame::new(format, "Test", "Tester");
    frame.points = points;
    frame
}

fn status_bytes(bytes: &[u8], format: FormatCode, count: usize) -> Vec<u8> {
    let status_at = if format.is_3d() { 6 } else { 4 };
    (0..count)
        .map(|i| bytes[32 + i * format.record_len() + status_at])
        .collect()
}

// ============================================================================
// Encoder Tests
// ============================================================================

#[test]
fn test_status_byte_marks_last_and_blanked_points() {
    let mut points = vec![
        point(0, 0, Color::Indexed(1)),
        point(10, 10, Color::Indexed(1)),
        point(20, 20, Color::Indexed(1)),
    ];
    points[1].blanked = true;
    let bytes = encode(&IldaFile::new(vec![frame(FormatCode::Indexed2d, points)])).unwrap();

    assert_eq!(
        status_bytes(&bytes, FormatCode::Indexed2d, 3),
        vec![0x00, 0x40, 0x80]
    );
}

#[test]
fn test_true_color_records_store_bgr() {
    let points = vec![point(-1, 1, Color::Rgb(Rgb::new(10, 20, 30)))];
    let bytes = encode(&IldaFile::new(vec![frame(FormatCode::TrueColor2d, points)])).unwrap();

    // x, y, status, b, g, r
    assert_eq!(&bytes[32..40], &[0xFF, 0xFF, 0x00, 0x01, 0x80, 30, 20, 10]);
}

#[test]
fn test_three_d_records_carry_z() {
    let mut p = point(1, 2, Color::Indexed(7));
    p.z = -3;
    let bytes = encode(&IldaFile::new(vec![frame(FormatCode::Indexed3d, vec![p])])).unwrap();

    assert_eq!(&bytes[32..40], &[0, 1, 0, 2, 0xFF, 0xFD, 0x80, 7]);
}

#[test]
fn test_names_are_nul_padded() {
    let bytes = encode(&IldaFile::new(vec![frame(
        FormatCode::Indexed2d,
        vec![point(0, 0, Color::Indexed(0))],
    )]))
    .unwrap();

    assert_eq!(&bytes[8..16], b"Test\0\0\0\0");
    assert_eq!(&bytes[16..24], b"Tester\0\0");
}

#[test]
fn test_multi_frame_numbering_and_terminator() {
    let mut file = IldaFile::new(
        (0..3)
            .map(|i| frame(FormatCode::Indexed2d, vec![point(i, i, Color::Indexed(0))]))
            .collect(),
    );
    file.renumber().unwrap();
    let bytes = encode(&file).unwrap();

    let section = 32 + 6;
    for i in 0..3 {
        let h = &bytes[i * section..];
        assert_eq!(u16::from_be_bytes([h[26], h[27]]), i as u16);
        assert_eq!(u16::from_be_bytes([h[28], h[29]]), 3);
    }

    let tail = &bytes[3 * section..];
    assert_eq!(tail.len(), 32);
    assert_eq!(tail[7], 1);
    assert_eq!(u16::from_be_bytes([tail[24], tail[25]]), 0);
    assert_eq!(u16::from_be_bytes([tail[26], tail[27]]), 3);
    assert_eq!(u16::from_be_bytes([tail[28], tail[29]]), 3);
}

#[test]
fn test_no_frames_is_empty_frame_error() {
    assert!(matches!(
        encode(&IldaFile::default()),
        Err(IldaError::EmptyFrame)
    ));
}

#[test]
fn test_rgb_in_indexed_frame_needs_palette() {
    let file = IldaFile::new(vec![frame(
        FormatCode::Indexed2d,
        vec![point(0, 0, Color::Rgb(RED))],
    )]);
    assert!(matches!(
        encode(&file),
        Err(IldaError::UnresolvedColor { frame: 0, point: 0 })
    ));
}

// ============================================================================
// Palette Tests
// ============================================================================

#[test]
fn test_palette_format_writes_palette_then_indexed_frame() {
    let config = PipelineConfig {
        format: FormatCode::Palette,
        ..Default::default()
    };
    let vectors = vec![
        VectorPath::new()
            .with_color(Color::Rgb(RED))
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0),
        VectorPath::new()
            .with_color(Color::Rgb(BLUE))
            .move_to(0.0, 10.0)
            .line_to(10.0, 10.0),
    ];
    let conversion = Pipeline::new(&config).with_vectors(vectors).run().unwrap();
    let bytes = conversion.to_bytes().unwrap();

    // Palette section: format 2, two RGB records, total frames 0
    assert_eq!(bytes[7], 2);
    assert_eq!(u16::from_be_bytes([bytes[24], bytes[25]]), 2);
    assert_eq!(u16::from_be_bytes([bytes[28], bytes[29]]), 0);
    assert_eq!(&bytes[32..38], &[255, 0, 0, 0, 0, 255]);

    // Frame section follows in format 1
    assert_eq!(bytes[38 + 7], 1);

    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded.palette, Some(Palette::new(vec![RED, BLUE])));
    let indices: Vec<Color> = decoded.frames[0].points.iter().map(|p| p.color).collect();
    assert!(indices.contains(&Color::Indexed(0)));
    assert!(indices.contains(&Color::Indexed(1)));
}

#[test]
fn test_indexed_colors_expand_through_palette() {
    let mut file = IldaFile::new(vec![frame(
        FormatCode::TrueColor2d,
        vec![point(0, 0, Color::Indexed(1))],
    )])
    .with_palette(Palette::new(vec![RED, BLUE]));
    file.resolve_colors().unwrap();

    assert_eq!(file.frames[0].points[0].color, Color::Rgb(BLUE));
}

#[test]
fn test_empty_palette_is_rejected() {
    let file = IldaFile::new(vec![frame(
        FormatCode::Indexed2d,
        vec![point(0, 0, Color::Indexed(0))],
    )])
    .with_palette(Palette::new(Vec::new()));

    assert!(matches!(
        encode(&file),
        Err(IldaError::EncodingOverflow {
            field: "palette",
            ..
        })
    ));
}

#[test]
fn test_index_outside_palette_is_rejected() {
    let file = IldaFile::new(vec![frame(
        FormatCode::Indexed2d,
        vec![point(0, 0, Color::Indexed(0)), point(5, 5, Color::Indexed(2))],
    )])
    .with_palette(Palette::new(vec![RED, BLUE]));

    assert!(matches!(
        encode(&file),
        Err(IldaError::UnresolvedColor { frame: 0, point: 1 })
    ));
}

// ============================================================================
// Decoder Tests
// ============================================================================

#[test]
fn test_decode_splits_polylines_at_blanks() {
    let mut points: Vec<ScanPoint> = (0..6).map(|i| point(i, 0, Color::Indexed(0))).collect();
    points[3].blanked = true;
    let bytes = encode(&IldaFile::new(vec![frame(FormatCode::Indexed2d, points)])).unwrap();

    let decoded = decode(&bytes).unwrap();
    let runs: Vec<usize> = decoded.polylines().iter().map(Vec::len).collect();
    assert_eq!(runs, vec![3, 3]);
}

#[test]
fn test_decode_reports_truncation_offset() {
    let bytes = encode(&IldaFile::new(vec![frame(
        FormatCode::TrueColor3d,
        vec![point(0, 0, Color::Rgb(RED)); 4],
    )]))
    .unwrap();

    match decode(&bytes[..50]) {
        Err(IldaError::Decode { offset, .. }) => assert_eq!(offset, 32),
        other => panic!("expected decode error, got {:?}", other),
    }
}

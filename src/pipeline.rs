//! Stage orchestration and the atomic file commit.
//!
//! A [`Pipeline`] runs contour extraction, simplification, normalization,
//! ordering, mapping and frame building in that order, each stage taking
//! the previous stage's output by value. Nothing touches the filesystem
//! until [`write_atomic`] commits the finished byte buffer.

use std::io::Write;
use std::path::Path as FsPath;

use tempfile::NamedTempFile;

use crate::bitmap::BinaryImage;
use crate::config::PipelineConfig;
use crate::contour::extract_contours;
use crate::diagnostics::Diagnostics;
use crate::error::{IldaError, Result, Stage};
use crate::ilda::{self, IldaFile, Palette};
use crate::mapper::map_paths;
use crate::normalize::normalize;
use crate::optimize::{PathOrderer, order_paths_with};
use crate::simplify::simplify_paths;
use crate::types::{Color, Path, PathSet, XForm};
use crate::vector::{self, VectorPath};

type ColorMap<'a> = Box<dyn Fn(usize, &Path) -> Option<Color> + 'a>;
type Orderer<'a> = Box<dyn PathOrderer + 'a>;

/// Result of one conversion run.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub file: IldaFile,
    pub diagnostics: Diagnostics,
    /// Source (x, y) to ILDA (x, y); invert it to map decoded points back
    pub transform: XForm,
}

impl Conversion {
    /// Serialize the file, terminator included.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        ilda::encode(&self.file)
    }

    /// Encode and commit to `path` in one atomic step.
    pub fn write_to<P: AsRef<FsPath>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)
    }
}

/// Builder for one conversion run.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    image: Option<&'a BinaryImage>,
    vectors: Vec<VectorPath>,
    color_map: Option<ColorMap<'a>>,
    orderer: Option<Orderer<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            image: None,
            vectors: Vec::new(),
            color_map: None,
            orderer: None,
        }
    }

    pub fn with_image(mut self, image: &'a BinaryImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_vectors(mut self, vectors: Vec<VectorPath>) -> Self {
        self.vectors.extend(vectors);
        self
    }

    /// Assign colors to normalized paths by index. Returning `None` keeps
    /// the path's own color (or the configured default).
    pub fn with_color_map<F>(mut self, color_for: F) -> Self
    where
        F: Fn(usize, &Path) -> Option<Color> + 'a,
    {
        self.color_map = Some(Box::new(color_for));
        self
    }

    /// Order paths with a caller-supplied strategy instead of
    /// `config.orderer`.
    pub fn with_orderer<O>(mut self, orderer: O) -> Self
    where
        O: PathOrderer + 'a,
    {
        self.orderer = Some(Box::new(orderer));
        self
    }

    pub fn run(self) -> Result<Conversion> {
        let config = self.config;
        config.validate()?;

        let mut diagnostics = Diagnostics::new();

        let pixel_paths = match self.image {
            Some(image) => {
                let traced = extract_contours(image, config.threshold)?;
                for (i, path) in traced.iter().enumerate() {
                    if path.len() == 1 {
                        diagnostics.push(
                            Stage::ContourExtractor,
                            Some(i),
                            "isolated pixel kept as a single point",
                        );
                    }
                }
                simplify_paths(traced, config.epsilon_for(image.diagonal()))
            }
            None => PathSet::new(),
        };

        let vector_paths = if self.vectors.is_empty() {
            PathSet::new()
        } else {
            let flat = vector::flatten_all(&self.vectors, config.flatten_tolerance);
            let diagonal = self
                .image
                .map_or_else(|| flat.bounds().diagonal(), BinaryImage::diagonal);
            simplify_paths(flat, config.epsilon_for(diagonal))
        };

        let mut paths = normalize(pixel_paths, vector_paths, config, &mut diagnostics);
        if paths.is_empty() {
            return Err(IldaError::geometry(
                Stage::PathNormalizer,
                None,
                "no drawable paths in the input",
            ));
        }

        if let Some(color_for) = &self.color_map {
            paths.assign_colors(|i, path| color_for(i, path));
        }

        let orderer: &dyn PathOrderer = match &self.orderer {
            Some(custom) => custom.as_ref(),
            None => &config.orderer,
        };
        let ordered = order_paths_with(orderer, paths, config.max_unblanked_jump)?;
        let mapping = map_paths(ordered, config, &mut diagnostics);
        let frame = ilda::build_frame(&mapping.paths, config);

        let mut file = IldaFile::new(vec![frame]);
        if config.format == ilda::FormatCode::Palette {
            file.palette = Some(palette_from_points(&file)?);
        }
        file.renumber()?;
        file.resolve_colors()?;

        tracing::info!(
            paths = mapping.paths.len(),
            points = file.point_count(),
            diagnostics = diagnostics.len(),
            format = %config.format,
            "conversion finished"
        );

        Ok(Conversion {
            file,
            diagnostics,
            transform: mapping.transform,
        })
    }
}

/// Palette of the distinct RGB colors of every point, in first-use order.
///
/// Points must carry RGB colors; an index would refer into a palette that
/// does not exist yet.
fn palette_from_points(file: &IldaFile) -> Result<Palette> {
    let mut colors = Vec::with_capacity(file.point_count());
    for (fi, frame) in file.frames.iter().enumerate() {
        for (pi, p) in frame.points.iter().enumerate() {
            match p.color {
                Color::Rgb(rgb) => colors.push(rgb),
                Color::Indexed(_) => {
                    return Err(IldaError::UnresolvedColor {
                        frame: fi,
                        point: pi,
                    });
                }
            }
        }
    }
    Palette::from_colors(colors)
}

/// Write `bytes` to `path` so that readers see either the old file or the
/// complete new one.
///
/// The data goes to a temporary file in the destination directory, is
/// synced, then renamed over `path`. On any failure the temporary file is
/// removed and `path` is left as it was.
pub fn write_atomic<P: AsRef<FsPath>>(path: P, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => FsPath::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| IldaError::Io(e.error))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "file committed");
    Ok(())
}

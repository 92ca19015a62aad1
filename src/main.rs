use clap::{ArgGroup, Parser};
use ilda_tools::{
    FormatCode, IldaError, OrdererKind, Pipeline, PipelineConfig, load_binary_image, load_svg_file,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "ilda-tools",
    about = "Convert bitmap and SVG artwork into an ILDA laser frame",
    group(ArgGroup::new("input").args(["image", "svg"]).required(true).multiple(true))
)]
struct Cli {
    /// Input image path (PNG, JPEG); dark pixels are traced
    #[arg(long)]
    image: Option<PathBuf>,

    /// Input SVG path; stroked and filled shapes are drawn as outlines
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Output ILDA file
    #[arg(short, long)]
    output: PathBuf,

    /// ILDA format code: 0, 1, 4, 5, or 2 for a palette plus format 1 frames
    #[arg(short, long, default_value_t = 1)]
    format: u8,

    /// Simplification tolerance in source units (default: 0.1% of the diagonal, 0 = off)
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Longest travel between paths drawn without blanking (default: blank every jump)
    #[arg(long)]
    max_jump: Option<f64>,

    /// Foreground threshold for image input
    #[arg(short, long, default_value_t = 128)]
    threshold: u8,

    /// Trace light pixels instead of dark ones
    #[arg(long)]
    invert: bool,

    /// Frame name written to the header (up to 8 bytes)
    #[arg(long, default_value = "Frame000")]
    name: String,

    /// Company name written to the header (up to 8 bytes)
    #[arg(long, default_value = "ILDA")]
    company: String,

    /// Path ordering strategy: nearest or insertion
    #[arg(long, default_value = "nearest")]
    orderer: OrdererKind,

    /// Log every stage
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), IldaError> {
    let config = PipelineConfig {
        threshold: cli.threshold,
        simplify_epsilon: cli.epsilon,
        max_unblanked_jump: cli.max_jump,
        orderer: cli.orderer,
        format: FormatCode::try_from(cli.format)?,
        frame_name: cli.name,
        company_name: cli.company,
        ..Default::default()
    };
    config.validate()?;

    let image = cli
        .image
        .as_ref()
        .map(|path| load_binary_image(path, cli.invert))
        .transpose()?;
    let vectors = match &cli.svg {
        Some(path) => load_svg_file(path)?,
        None => Vec::new(),
    };

    let mut pipeline = Pipeline::new(&config).with_vectors(vectors);
    if let Some(image) = &image {
        pipeline = pipeline.with_image(image);
    }
    let conversion = pipeline.run()?;
    conversion.write_to(&cli.output)?;

    println!(
        "Wrote {} points ({} warnings) to '{}' as format {}",
        conversion.file.point_count(),
        conversion.diagnostics.len(),
        cli.output.display(),
        config.format.code()
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

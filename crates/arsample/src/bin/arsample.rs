use arsample::assets::{self, DfgFormat, DfgParams};
use arsample::io::PlaneMeshRequest;
use arsample::vision::SobelParams;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use arsample::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use arsample::core::{init_with_level, level_from_verbosity};
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

#[derive(Parser, Debug)]
#[command(name = "arsample", version, about = "Offline tools for AR sample assets and camera frames")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the Sobel edge image of a picture (converted to gray first)
    Edges {
        input: PathBuf,
        output: PathBuf,
        /// Squared gradient magnitude above which a pixel is an edge
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// Build a plane fade mesh from a JSON request and write a JSON report
    PlaneMesh {
        request: PathBuf,
        /// Report path; overrides `output_path` from the request
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Generate a DFG lookup table for image-based lighting
    Dfg {
        #[arg(long, short)]
        output: PathBuf,
        #[arg(long, short, default_value_t = assets::DEFAULT_DFG_RESOLUTION)]
        resolution: usize,
        #[arg(long, short, default_value_t = assets::DEFAULT_DFG_SAMPLES)]
        samples: u32,
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Raw)]
        format: OutputFormat,
    },
    /// Load an OBJ model and print its mesh statistics
    ObjInfo { path: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Raw,
    Ppm,
}

impl From<OutputFormat> for DfgFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Raw => DfgFormat::Raw,
            OutputFormat::Ppm => DfgFormat::Ppm,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.cmd {
        Command::Edges {
            input,
            output,
            threshold,
        } => {
            let img = image::ImageReader::open(&input)?.decode()?.to_luma8();
            let mut params = SobelParams::default();
            if let Some(threshold) = threshold {
                params.threshold = threshold;
            }
            let edges = arsample::detect::detect_edges_image(&img, &params)?;
            edges.save(&output)?;
            println!(
                "wrote {}x{} edge image to {}",
                edges.width(),
                edges.height(),
                output.display()
            );
        }
        Command::PlaneMesh { request, output } => {
            let request = PlaneMeshRequest::load_json(&request)?;
            let output = output.unwrap_or_else(|| request.output_path());
            let report = request.build_report()?;
            report.write_json(&output)?;
            println!(
                "plane mesh: {} boundary vertices -> {} vertices, {} indices; wrote {}",
                report.boundary_vertices,
                report.vertex_count,
                report.index_count,
                output.display()
            );
        }
        Command::Dfg {
            output,
            resolution,
            samples,
            format,
        } => {
            let table = assets::generate_dfg(&DfgParams {
                resolution,
                samples,
            })?;
            table.save(&output, format.into())?;
            println!(
                "wrote {res}x{res} DFG table ({format:?}) to {}",
                output.display(),
                res = table.resolution
            );
        }
        Command::ObjInfo { path } => {
            let mesh = assets::load_obj(&path)?;
            info!("loaded {}", path.display());
            println!("vertices: {}", mesh.vertex_count());
            println!("triangles: {}", mesh.triangle_count());
            println!("normals: {}", if mesh.has_normals() { "yes" } else { "no" });
            println!("uvs: {}", if mesh.has_uvs() { "yes" } else { "no" });
            if let Some((lo, hi)) = mesh.bounds() {
                println!(
                    "bounds: [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
                    lo.x, lo.y, lo.z, hi.x, hi.y, hi.z
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    {
        // Filtering comes from RUST_LOG here; -v only drives the plain logger.
        let _ = verbose;
        init_tracing(false);
        // No-op when the subscriber already bridged `log` records.
        let _ = LogTracer::init();
    }
    #[cfg(not(feature = "tracing"))]
    init_with_level(level_from_verbosity(verbose))?;
    Ok(())
}

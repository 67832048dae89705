//! Edgefold CLI - mesh simplification command-line tool.
//!
//! Usage: edgefold <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `edgefold --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use edgefold::algo::simplify::{
    self, CostPolicy, EdgeCountStop, EdgeLengthCost, EdgeRatioStop, FaceCountStop,
    MidpointPlacement, PlacementPolicy, QuadricCost, QuadricPlacement, SimplifyOptions,
    StopPredicate,
};
use edgefold::algo::remesh::{self, RemeshOptions};
use edgefold::algo::{subdivide, Progress};
use edgefold::io;
use edgefold::mesh::HalfEdgeMesh;

#[derive(Parser)]
#[command(name = "edgefold")]
#[command(author, version, about = "Edge-collapse mesh simplification", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh statistics
    Info {
        /// Input OFF file
        input: PathBuf,
    },

    /// Simplify a triangle mesh by edge collapse
    Simplify {
        /// Input OFF file
        input: PathBuf,

        /// Output OFF file
        output: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Collapse cost
        #[arg(short, long, value_enum, default_value = "edge-length")]
        cost: CostMethod,

        /// Placement of the merged vertex
        #[arg(short, long, value_enum, default_value = "midpoint")]
        placement: PlacementMethod,

        /// Allow boundary edges to be collapsed and boundary vertices to move
        #[arg(long)]
        collapse_boundary: bool,

        /// Accept collapses that flip or flatten faces
        #[arg(long)]
        allow_flips: bool,

        /// Stop after this many collapses
        #[arg(long)]
        max_collapses: Option<usize>,

        /// Use single-threaded scoring (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Subdivide a mesh
    Subdivide {
        /// Input OFF file
        input: PathBuf,

        /// Output OFF file
        output: PathBuf,

        /// Subdivision method
        #[arg(short, long, value_enum, default_value = "loop")]
        method: SubdivideMethod,

        /// Number of subdivision iterations
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Remesh a triangle mesh towards a uniform edge length
    Remesh {
        /// Input OFF file
        input: PathBuf,

        /// Output OFF file
        output: PathBuf,

        /// Target edge length (default: average edge length)
        #[arg(short = 'l', long)]
        target_length: Option<f64>,

        /// Number of remeshing iterations
        #[arg(short, long, default_value = "5")]
        iterations: usize,

        /// Let boundary edges be split or collapsed and boundary vertices move
        #[arg(long)]
        move_boundary: bool,

        /// Use single-threaded smoothing (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

/// When to stop simplifying. Exactly one is required.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Stop at this many edges
    #[arg(short, long)]
    edges: Option<usize>,

    /// Stop at this fraction of the original edges (0.0 to 1.0)
    #[arg(short, long)]
    ratio: Option<f64>,

    /// Stop at this many faces
    #[arg(short, long)]
    faces: Option<usize>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CostMethod {
    /// Shortest edges first
    EdgeLength,
    /// Quadric error of the surrounding planes
    Quadric,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PlacementMethod {
    /// Midpoint of the edge
    Midpoint,
    /// Quadric-optimal point
    Quadric,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SubdivideMethod {
    /// Loop subdivision (triangle meshes only)
    Loop,
    /// Catmull-Clark subdivision (any polygons, produces quads)
    CatmullClark,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Simplify {
            input,
            output,
            target,
            cost,
            placement,
            collapse_boundary,
            allow_flips,
            max_collapses,
            sequential,
        } => {
            let mut options = SimplifyOptions::default()
                .with_preserve_boundary(!collapse_boundary)
                .with_prevent_face_flips(!allow_flips)
                .with_parallel(!sequential);
            options.max_collapses = max_collapses;
            cmd_simplify(&input, &output, &target, cost, placement, &options)?;
        }

        Commands::Subdivide {
            input,
            output,
            method,
            iterations,
            sequential,
        } => {
            cmd_subdivide(&input, &output, method, iterations, sequential)?;
        }

        Commands::Remesh {
            input,
            output,
            target_length,
            iterations,
            move_boundary,
            sequential,
        } => {
            cmd_remesh(&input, &output, target_length, iterations, move_boundary, sequential)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only ever move forward.
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (raw_percent * bar_width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {}",
            "=".repeat(filled),
            " ".repeat(bar_width - filled),
            raw_percent,
            message
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("{}", mesh.stats());
    if mesh.num_faces() > 0 {
        println!("surface area:   {:.6}", mesh.surface_area());
    }

    Ok(())
}

fn cmd_simplify(
    input: &Path,
    output: &Path,
    target: &Target,
    cost: CostMethod,
    placement: PlacementMethod,
    options: &SimplifyOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;

    println!(
        "Loaded: {} vertices, {} faces, {} edges",
        mesh.num_vertices(),
        mesh.num_faces(),
        mesh.num_edges()
    );

    let stop: Box<dyn StopPredicate<u32>> = match (target.edges, target.ratio, target.faces) {
        (Some(edges), _, _) => Box::new(EdgeCountStop::new(edges)),
        (_, Some(ratio), _) => Box::new(EdgeRatioStop::new(ratio)?),
        (_, _, Some(faces)) => Box::new(FaceCountStop::new(faces)),
        (None, None, None) => return Err("one of --edges, --ratio or --faces is required".into()),
    };
    let cost: &dyn CostPolicy<u32> = match cost {
        CostMethod::EdgeLength => &EdgeLengthCost,
        CostMethod::Quadric => &QuadricCost,
    };
    let placement: &dyn PlacementPolicy<u32> = match placement {
        PlacementMethod::Midpoint => &MidpointPlacement,
        PlacementMethod::Quadric => &QuadricPlacement,
    };

    let progress = create_progress();
    let start = Instant::now();
    let report =
        simplify::simplify_with_progress(&mut mesh, stop.as_ref(), cost, placement, options, &progress)?;
    let elapsed = start.elapsed();
    if report.collapses > 0 {
        progress.report(1, 1, "Collapsing edges");
    }

    println!("{} edges removed", report.edges_removed);
    println!("{} final edges", report.final_edge_count);
    println!(
        "{} collapses ({}); rejected {} stale, {} illegal, {} by policy",
        report.collapses,
        report.stop_reason,
        report.rejected_stale,
        report.rejected_illegal,
        report.rejected_policy
    );

    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_subdivide(
    input: &Path,
    output: &Path,
    method: SubdivideMethod,
    iterations: usize,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let options = subdivide::SubdivideOptions::new(iterations).with_parallel(!sequential);
    let mode = if sequential { "sequential" } else { "parallel" };
    let progress = create_progress();

    let start = Instant::now();
    match method {
        SubdivideMethod::Loop => {
            println!("Applying Loop subdivision ({} iterations, {})...", iterations, mode);
            subdivide::loop_subdivide_with_progress(&mut mesh, &options, &progress)?;
        }
        SubdivideMethod::CatmullClark => {
            println!("Applying Catmull-Clark subdivision ({} iterations, {})...", iterations, mode);
            subdivide::catmull_clark_subdivide_with_progress(&mut mesh, &options, &progress)?;
        }
    }
    let elapsed = start.elapsed();

    println!("Result: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_remesh(
    input: &Path,
    output: &Path,
    target_length: Option<f64>,
    iterations: usize,
    move_boundary: bool,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let target = target_length.unwrap_or_else(|| remesh::average_edge_length(&mesh));
    let options = RemeshOptions::with_target_length(target)
        .with_iterations(iterations)
        .with_preserve_boundary(!move_boundary)
        .with_parallel(!sequential);
    let progress = create_progress();

    println!("Remeshing to edge length {:.6} ({} iterations)...", target, iterations);
    let start = Instant::now();
    remesh::isotropic_remesh_with_progress(&mut mesh, &options, &progress)?;
    let elapsed = start.elapsed();

    println!(
        "Result: {} vertices, {} faces, average edge {:.6}",
        mesh.num_vertices(),
        mesh.num_faces(),
        remesh::average_edge_length(&mesh)
    );
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

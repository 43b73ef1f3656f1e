//! Unfold CLI - automatic UV unwrapping from the command line.
//!
//! Usage: unfold <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `unfold --help` for available commands. Set `RUST_LOG` to change the
//! log level (default `info`).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;

use unfold::algo::topology::build_topology;
use unfold::algo::tune::{self, Metric, ParameterGrid};
use unfold::algo::unwrap::{unwrap_with_progress, UnwrapOptions, UnwrapResult};
use unfold::algo::Progress;
use unfold::io;
use unfold::io::cache::{CacheKey, UnwrapCache};
use unfold::mesh::TriMesh;

#[derive(Parser)]
#[command(name = "unfold")]
#[command(author, version, about = "Automatic UV unwrapping CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct UnwrapArgs {
    /// Angle threshold in degrees
    #[arg(long, default_value = "30.0")]
    angle: f64,

    /// Islands with fewer faces are left unmapped
    #[arg(long, default_value = "5")]
    min_faces: usize,

    /// Gap between packed islands in UV space
    #[arg(long, default_value = "0.02")]
    margin: f64,

    /// Keep islands stacked in the unit square instead of packing them
    #[arg(long)]
    no_pack: bool,

    /// Use single-threaded execution (for benchmarking)
    #[arg(long)]
    sequential: bool,
}

impl UnwrapArgs {
    fn options(&self) -> UnwrapOptions {
        UnwrapOptions::default()
            .with_angle_threshold(self.angle)
            .with_min_island_faces(self.min_faces)
            .with_island_margin(self.margin)
            .with_packing(!self.no_pack)
            .with_parallel(!self.sequential)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh and topology information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Unwrap a single mesh
    Unwrap {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        #[command(flatten)]
        args: UnwrapArgs,

        /// Skip quality metrics
        #[arg(long)]
        no_metrics: bool,
    },

    /// Unwrap every OBJ file in a directory
    Batch {
        /// Input directory
        input_dir: PathBuf,

        /// Output directory (created if missing)
        output_dir: PathBuf,

        #[command(flatten)]
        args: UnwrapArgs,

        /// Number of worker threads (default: all cores)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Reuse results stored in this directory and store new ones there
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Search for the best unwrapping parameters
    Optimize {
        /// Input mesh file
        input: PathBuf,

        /// Metric to optimize
        #[arg(short, long, value_enum, default_value = "stretch")]
        metric: MetricArg,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    /// Minimize the maximum stretch
    Stretch,
    /// Maximize UV coverage
    Coverage,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Stretch => Metric::Stretch,
            MetricArg::Coverage => Metric::Coverage,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

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

        Commands::Unwrap {
            input,
            output,
            args,
            no_metrics,
        } => {
            cmd_unwrap(&input, &output, &args, no_metrics)?;
        }

        Commands::Batch {
            input_dir,
            output_dir,
            args,
            threads,
            cache_dir,
        } => {
            cmd_batch(&input_dir, &output_dir, &args, threads, cache_dir.as_deref())?;
        }

        Commands::Optimize {
            input,
            metric,
            sequential,
        } => {
            cmd_optimize(&input, metric.into(), sequential)?;
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
        let percent = raw_percent.max(previous);

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {:<24}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());

    let areas: Vec<f64> = mesh.face_ids().map(|f| mesh.face_area(f)).collect();
    let min_area = areas.iter().copied().fold(f64::INFINITY, f64::min);
    let max_area = areas.iter().copied().fold(0.0, f64::max);
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6}, {:.6}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    let report = build_topology(&mesh)?.validate();
    println!("Edges: {}", report.edges);
    println!("Euler characteristic: {}", report.euler_characteristic);
    if report.boundary_edges == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary edges)", report.boundary_edges);
    }
    if report.non_manifold_edges > 0 {
        println!("Non-manifold edges: {}", report.non_manifold_edges);
    }
    println!("UVs: {}", if mesh.uvs().is_some() { "present" } else { "none" });

    Ok(())
}

fn print_result(result: &UnwrapResult) {
    println!("Islands: {} ({} mapped, {} skipped, {} failed)",
        result.num_islands,
        result.num_parameterized(),
        result.skipped_islands.len(),
        result.failed_islands.len());
    println!("Seams: {}", result.num_seams);
    for failure in &result.failed_islands {
        println!("  island {} ({} faces): {}", failure.island.index(), failure.faces, failure.reason);
    }
}

fn cmd_unwrap(
    input: &Path,
    output: &Path,
    args: &UnwrapArgs,
    no_metrics: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let options = args.options().with_metrics(!no_metrics);
    let mode = if args.sequential { "sequential" } else { "parallel" };
    println!("Unwrapping (angle {:.1}, min faces {}, {})...", args.angle, args.min_faces, mode);

    let progress = create_progress();
    let start = Instant::now();
    let (unwrapped, result) = unwrap_with_progress(&mesh, &options, &progress)?;
    let elapsed = start.elapsed();

    print_result(&result);
    if !no_metrics {
        let m = &result.metrics;
        println!("Stretch: avg {:.3}, max {:.3}", m.avg_stretch, m.max_stretch);
        println!("Coverage: {:.1}%", m.coverage * 100.0);
        println!("Angle distortion: {:.2}°", m.angle_distortion.to_degrees());
        if m.has_collapsed_triangles() {
            println!("Collapsed triangles: {}", m.collapsed_triangles);
        }
    }

    io::save(&unwrapped, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

enum Outcome {
    Unwrapped(UnwrapResult, Duration),
    Cached,
}

struct BatchItem {
    input: PathBuf,
    outcome: Result<Outcome, String>,
}

fn unwrap_file(
    input: &Path,
    output_dir: &Path,
    options: &UnwrapOptions,
    cache: Option<&UnwrapCache>,
) -> BatchItem {
    let run = || -> Result<Outcome, Box<dyn std::error::Error>> {
        let start = Instant::now();
        let mesh: TriMesh = io::load(input)?;
        let name = input.file_name().ok_or("input has no file name")?;
        let output = output_dir.join(name);

        let key = cache.map(|_| CacheKey::new(&mesh, options));
        if let (Some(cache), Some(key)) = (cache, &key) {
            if let Some(entry) = cache.lookup(key) {
                std::fs::copy(entry, &output)?;
                return Ok(Outcome::Cached);
            }
        }

        let (unwrapped, result) = unfold::algo::unwrap::unwrap(&mesh, options)?;
        io::save(&unwrapped, &output)?;
        if let (Some(cache), Some(key)) = (cache, &key) {
            cache.store(key, &unwrapped)?;
        }
        Ok(Outcome::Unwrapped(result, start.elapsed()))
    };

    BatchItem {
        input: input.to_path_buf(),
        outcome: run().map_err(|e| e.to_string()),
    }
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: &Path,
    args: &UnwrapArgs,
    threads: Option<usize>,
    cache_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && io::Format::from_path(p).is_some())
        .collect();
    files.sort();

    println!("Found {} mesh files in {}", files.len(), input_dir.display());
    if files.is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(output_dir)?;
    let cache = cache_dir.map(UnwrapCache::open).transpose()?;

    // Files are spread over the pool; each file unwraps its islands in order.
    let options = args.options().sequential();
    let done = AtomicUsize::new(0);
    let progress = create_progress();
    let total = files.len();

    let process = || -> Vec<BatchItem> {
        files
            .par_iter()
            .map(|input| {
                let item = unwrap_file(input, output_dir, &options, cache.as_ref());
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                let name = input.file_name().and_then(|n| n.to_str()).unwrap_or("?");
                progress.report(finished, total, name);
                item
            })
            .collect()
    };

    let start = Instant::now();
    let items = match threads {
        Some(n) => rayon::ThreadPoolBuilder::new().num_threads(n).build()?.install(process),
        None => process(),
    };
    let elapsed = start.elapsed();

    let mut succeeded = Vec::new();
    let mut cached = 0;
    for item in &items {
        match &item.outcome {
            Ok(Outcome::Unwrapped(result, time)) => succeeded.push((result, *time)),
            Ok(Outcome::Cached) => cached += 1,
            Err(e) => println!("Failed: {}: {}", item.input.display(), e),
        }
    }

    println!("\nBatch complete:");
    println!("  Total: {}", items.len());
    println!("  Success: {}", succeeded.len() + cached);
    if cache.is_some() {
        println!("  Cached: {}", cached);
    }
    println!("  Failed: {}", items.len() - succeeded.len() - cached);
    println!("  Total time: {:.2?}", elapsed);
    if !succeeded.is_empty() {
        let n = succeeded.len() as f64;
        let avg_time = succeeded.iter().map(|(_, t)| t.as_secs_f64()).sum::<f64>() / n;
        let avg_stretch = succeeded.iter().map(|(r, _)| r.metrics.avg_stretch).sum::<f64>() / n;
        let avg_coverage = succeeded.iter().map(|(r, _)| r.metrics.coverage).sum::<f64>() / n;
        println!("  Avg time: {:.3}s", avg_time);
        println!("  Avg stretch: {:.3}", avg_stretch);
        println!("  Avg coverage: {:.1}%", avg_coverage * 100.0);
    }

    Ok(())
}

fn cmd_optimize(
    input: &Path,
    metric: Metric,
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    let grid = ParameterGrid::default();
    let base = UnwrapOptions::default().with_parallel(!sequential);
    println!("Evaluating {} parameter combinations ({})...", grid.len(), metric);

    let progress = create_progress();
    let start = Instant::now();
    let result = tune::optimize_with_progress(&mesh, &grid, metric, &base, &progress)?;
    let elapsed = start.elapsed();

    for trial in &result.trials {
        println!("  angle {:5.1}  min faces {:3}  {} = {:.4}",
            trial.angle_threshold, trial.min_island_faces, metric, trial.value);
    }
    if result.failures > 0 {
        println!("  {} combinations failed", result.failures);
    }

    match result.best {
        Some(best) => {
            println!("\nBest parameters (optimize {}):", metric);
            println!("  --angle {} --min-faces {}", best.angle_threshold, best.min_island_faces);
            println!("  {} = {:.4} ({:.2?})", metric, best.value, elapsed);
        }
        None => println!("\nEvery parameter combination failed"),
    }

    Ok(())
}

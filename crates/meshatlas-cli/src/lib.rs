//! # Meshatlas CLI
//!
//! Command-line interface for the mesh atlas splitter.
//!
//! ## Commands
//! - `split` - Split a combined mesh into one mesh per cell
//! - `inspect` - Dry run: report how vertices would be distributed
//! - `plan` - List the cells of a placement plan

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use meshatlas_assets::{ObjMesh, PlacementPlan};
use meshatlas_core::{AxisConvention, SplitConfig};
use meshatlas_split::AtlasSplitter;

/// Mesh atlas splitter
#[derive(Parser)]
#[command(name = "meshatlas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by commands that run the pipeline
#[derive(Args, Debug, Default)]
pub struct TuningArgs {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name outputs `<prefix>_<index>` instead of by cell name
    #[arg(long)]
    pub prefix: Option<String>,

    /// Absolute fragment threshold in vertices
    #[arg(long)]
    pub fragment_floor: Option<usize>,

    /// Fragment threshold as a fraction of the mean cluster size
    #[arg(long)]
    pub fragment_fraction: Option<f64>,

    /// Axis convention: z-up-source or identity
    #[arg(long)]
    pub axes: Option<AxisConvention>,

    /// Write cells one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,
}

impl TuningArgs {
    /// Load the config file, if any, and apply flag overrides
    pub fn resolve(&self) -> Result<SplitConfig> {
        let mut config = match &self.config {
            Some(path) => SplitConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SplitConfig::default(),
        };

        if let Some(prefix) = &self.prefix {
            config.name_prefix = Some(prefix.clone());
        }
        if let Some(floor) = self.fragment_floor {
            config.fragment_floor = floor;
        }
        if let Some(fraction) = self.fragment_fraction {
            config.fragment_fraction = fraction;
        }
        if let Some(axes) = self.axes {
            config.axes = axes;
        }
        if self.sequential {
            config.parallel_writes = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Split a combined mesh into one mesh per cell
    Split {
        /// Combined mesh (.obj)
        mesh: PathBuf,

        /// Placement plan; defaults to `<mesh stem>_layout.json` next to the mesh
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Write a JSON report of the outputs
        #[arg(short, long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Report how vertices would be distributed without writing anything
    Inspect {
        /// Combined mesh (.obj)
        mesh: PathBuf,

        /// Placement plan; defaults to `<mesh stem>_layout.json` next to the mesh
        #[arg(short, long)]
        plan: Option<PathBuf>,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// List the cells of a placement plan
    Plan {
        /// Placement plan (.json)
        path: PathBuf,

        /// Axis convention used to convert offsets to mesh space
        #[arg(long, default_value = "z-up-source")]
        axes: AxisConvention,
    },
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).try_init();

    match cli.command {
        Commands::Split {
            mesh,
            plan,
            out,
            report,
            tuning,
        } => {
            let config = tuning.resolve()?;
            let plan = load_plan(&mesh, plan.as_deref())?;
            let splitter = AtlasSplitter::new(config)?;

            let result = splitter
                .split_file(&mesh, &plan, &out)
                .with_context(|| format!("Failed to split {}", mesh.display()))?;

            for output in &result.outputs {
                log::info!(
                    "  {} ({}): {} vertices, {} faces",
                    output.name,
                    output.original_name,
                    output.vertex_count,
                    output.face_count
                );
            }
            for name in &result.skipped {
                log::warn!("  {}: empty, skipped", name);
            }

            if let Some(path) = report {
                std::fs::write(&path, serde_json::to_string_pretty(&result)?)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
                log::info!("Report written to {}", path.display());
            }

            if !result.is_complete() {
                bail!(
                    "{} of {} cells failed to write",
                    result.failures.len(),
                    result.failures.len() + result.outputs.len()
                );
            }
            log::info!("Split complete!");
        }

        Commands::Inspect { mesh, plan, tuning } => {
            let config = tuning.resolve()?;
            let plan = load_plan(&mesh, plan.as_deref())?;
            let splitter = AtlasSplitter::new(config)?;

            let parsed = ObjMesh::from_path(&mesh)
                .with_context(|| format!("Failed to read {}", mesh.display()))?;
            let partition = splitter.partition(&parsed, &plan)?;
            let stats = partition.stats;

            log::info!("{}", mesh.display());
            log::info!("  Vertices: {}", stats.vertices);
            log::info!("  Faces: {}", stats.faces);
            log::info!("  Clusters: {}", stats.clusters);
            log::info!(
                "  Fragments: {} below {:.1} vertices ({} moved)",
                stats.fragments,
                stats.fragment_threshold,
                stats.reassigned
            );
            log::info!("  Healed faces: {}", stats.healed_faces);
            for (cell, count) in partition.cells.iter().zip(partition.vertex_counts()) {
                log::info!("  [{}, {}] {}: {} vertices", cell.col, cell.row, cell.name, count);
            }
        }

        Commands::Plan { path, axes } => {
            let plan = PlacementPlan::from_json_file(&path)
                .with_context(|| format!("Failed to load plan {}", path.display()))?;

            log::info!("{}x{} grid, cell size {}", plan.cols, plan.rows, plan.cell_size);
            for cell in plan.cells(axes) {
                log::info!(
                    "  [{}, {}] {}: ({}, {}) - ({}, {}), offset {}",
                    cell.col,
                    cell.row,
                    cell.name,
                    cell.footprint.min.x,
                    cell.footprint.min.y,
                    cell.footprint.max.x,
                    cell.footprint.max.y,
                    cell.offset
                );
            }
        }
    }

    Ok(())
}

/// Load the given plan, or the sidecar next to the mesh
fn load_plan(mesh: &Path, plan: Option<&Path>) -> Result<PlacementPlan> {
    let path = match plan {
        Some(path) => path.to_path_buf(),
        None => PlacementPlan::sidecar_path(mesh),
    };
    PlacementPlan::from_json_file(&path).with_context(|| format!("Failed to load plan {}", path.display()))
}

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use range42::config::SettingsOverrides;
use range42::config_loader::{load_project, resolve_settings};
use range42::export::{deliver, export_project, export_topology_only, DirectorySink};
use std::fs;
use std::path::{Path, PathBuf};

/// Export a Range42 infrastructure graph as a deployable bundle
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the project file exported by the editor (JSON or YAML)
    #[arg(short, long)]
    project: PathBuf,

    /// Output directory for the export bundle
    #[arg(short, long, default_value = "range42_export")]
    output: PathBuf,

    /// Only export the topology document and metadata
    #[arg(long)]
    topology_only: bool,

    /// Range42 API base URL, overriding the project settings
    #[arg(long)]
    base_url: Option<String>,

    /// Proxmox node to create VMs on, overriding the project settings
    #[arg(long)]
    node: Option<String>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting range42 export");
    info!("Project file: {:?}", args.project);
    info!("Output directory: {:?}", args.output);

    let project = load_project(&args.project)?;
    let overrides = SettingsOverrides {
        base_url: args.base_url.clone(),
        default_node: args.node.clone(),
    };
    let settings = resolve_settings(&project, &overrides)?;

    let bundle = if args.topology_only {
        export_topology_only(&project, &settings)
    } else {
        export_project(&project, &settings)
    }
    .wrap_err("Failed to build export bundle")?;

    let metadata = &bundle.metadata;
    if !metadata.validation_warnings.is_empty() {
        warn!("{} validation warnings, see metadata.json", metadata.validation_warnings.len());
    }
    for failure in &metadata.generator_failures {
        warn!("Generator {} produced no artifacts: {}", failure.generator, failure.error);
    }

    // Clean up the previous export
    if args.output.exists() && args.output != Path::new(".") {
        info!("Removing previous export in {:?}", args.output);
        fs::remove_dir_all(&args.output)
            .wrap_err_with(|| format!("Failed to remove output directory '{}'", args.output.display()))?;
    }

    let mut sink = DirectorySink::new(&args.output);
    deliver(&bundle, &mut sink)
        .wrap_err_with(|| format!("Failed to write bundle to '{}'", args.output.display()))?;

    info!("Export completed: {} artifacts in {:?}", bundle.len(), args.output);
    if !args.topology_only {
        info!("Deploy with: {:?}", args.output.join("scripts/deploy.sh"));
    }
    Ok(())
}

//! Arbor CLI - Command-line interface for low-poly tree generation

use anyhow::{Context, Result};
use arbor_core::config::LeafGeometry;
use arbor_core::export::{MeshExport, import_obj};
use arbor_core::mesh::Mesh;
use arbor_core::{GeneratedTree, TreeConfig, TreeGenerator};
use clap::{Parser, Subcommand};
use rand::Rng;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Length of seeds produced by `arbor seed` and `--new-seed`
const SEED_LENGTH: usize = 10;

const SEED_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Seeded procedural low-poly tree generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a tree and export it
    Generate {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (format auto-detected from extension)
        #[arg(short, long, default_value = "tree.obj")]
        output: PathBuf,

        /// Seed string, overrides the configuration
        #[arg(short, long, conflicts_with = "new_seed")]
        seed: Option<String>,

        /// Use a fresh random seed for this run
        #[arg(long)]
        new_seed: bool,

        /// Write a fresh seed back into the configuration file after generating
        #[arg(long, requires = "config")]
        regenerate_seed: bool,

        /// Branch depth, overrides the configuration
        #[arg(short, long)]
        depth: Option<u32>,

        /// Leaf geometry (cube, icosphere, custom), overrides the configuration
        #[arg(long, value_parser = parse_leaf_geometry)]
        leaf_geometry: Option<LeafGeometry>,

        /// OBJ file used as leaf geometry
        #[arg(long)]
        leaf_object: Option<PathBuf>,

        /// Generate the stem only
        #[arg(long)]
        no_leaves: bool,

        /// Available material name (repeatable), replaces the configured list
        #[arg(short, long = "material")]
        materials: Vec<String>,
    },

    /// Print a fresh random seed
    Seed,

    /// Write the default configuration as JSON
    Init {
        /// Configuration file to create
        #[arg(short, long, default_value = "arbor.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate a tree and print mesh statistics
    Info {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed string, overrides the configuration
        #[arg(short, long)]
        seed: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            config,
            output,
            seed,
            new_seed,
            regenerate_seed,
            depth,
            leaf_geometry,
            leaf_object,
            no_leaves,
            materials,
        } => {
            let mut tree_config = load_config(config.as_deref())?;
            if let Some(seed) = seed {
                tree_config.seed = seed;
            } else if new_seed {
                tree_config.seed = random_seed();
            }
            if let Some(depth) = depth {
                tree_config.branch.depth = depth;
            }
            if no_leaves {
                tree_config.leaf.enabled = false;
            }
            if !materials.is_empty() {
                tree_config.materials = materials;
            }
            if let Some(geometry) = leaf_geometry {
                tree_config.leaf.geometry = geometry;
            }
            if let Some(path) = &leaf_object {
                tree_config.leaf.geometry = LeafGeometry::Custom;
                tree_config.leaf.object = Some(path.display().to_string());
            }

            run_generate(&tree_config, &output)?;

            if let Some(path) = config.as_deref().filter(|_| regenerate_seed) {
                tree_config.seed = random_seed();
                tree_config
                    .save(path)
                    .with_context(|| format!("Failed to update {}", path.display()))?;
                println!("Next seed: {} (saved to {})", tree_config.seed, path.display());
            }
        }
        Commands::Seed => {
            println!("{}", random_seed());
        }
        Commands::Init { output, force } => {
            run_init(&output, force)?;
        }
        Commands::Info { config, seed } => {
            let mut tree_config = load_config(config.as_deref())?;
            if let Some(seed) = seed {
                tree_config.seed = seed;
            }
            run_info(&tree_config)?;
        }
    }

    Ok(())
}

fn parse_leaf_geometry(s: &str) -> std::result::Result<LeafGeometry, String> {
    LeafGeometry::parse(s).ok_or_else(|| {
        let names: Vec<_> = LeafGeometry::ALL.iter().map(|g| g.name()).collect();
        format!("unknown leaf geometry '{}' (expected {})", s, names.join(", "))
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Random seed of ASCII letters
fn random_seed() -> String {
    let mut rng = rand::thread_rng();
    (0..SEED_LENGTH)
        .map(|_| char::from(SEED_ALPHABET[rng.gen_range(0..SEED_ALPHABET.len())]))
        .collect()
}

fn load_config(path: Option<&Path>) -> Result<TreeConfig> {
    match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            TreeConfig::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))
        }
        None => Ok(TreeConfig::default()),
    }
}

/// Load the custom leaf object named by the configuration, if any
fn load_leaf_object(config: &TreeConfig) -> Result<Option<Mesh>> {
    if !config.leaf.enabled || config.leaf.geometry != LeafGeometry::Custom {
        return Ok(None);
    }
    let Some(object) = &config.leaf.object else {
        anyhow::bail!("Custom leaf geometry needs a leaf object (--leaf-object FILE.obj)");
    };
    let mesh = import_obj(Path::new(object))
        .with_context(|| format!("Failed to read leaf object {}", object))?;
    Ok(Some(mesh))
}

fn build_tree(config: &TreeConfig) -> Result<GeneratedTree> {
    let leaf_object = load_leaf_object(config)?;
    let mut generator = TreeGenerator::new(config);
    if let Some(mesh) = &leaf_object {
        generator = generator.with_leaf_object(mesh);
    }
    generator
        .run()
        .with_context(|| format!("Failed to generate tree with seed '{}'", config.seed))
}

fn run_generate(config: &TreeConfig, output: &Path) -> Result<()> {
    println!("Generating tree (seed {})...", config.seed);

    let tree = build_tree(config)?;
    println!(
        "Generated mesh: {} vertices, {} faces, {} leaves",
        tree.mesh.vertex_count(),
        tree.mesh.face_count(),
        tree.leaves.len()
    );

    let format = tree
        .mesh
        .export(output)
        .with_context(|| format!("Failed to export {}", output.display()))?;
    println!("Exported {} to: {}", format.name(), output.display());

    Ok(())
}

fn run_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }
    TreeConfig::default()
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote default configuration to: {}", output.display());
    Ok(())
}

fn run_info(config: &TreeConfig) -> Result<()> {
    let tree = build_tree(config)?;
    let mesh = &tree.mesh;

    println!("Seed:       {}", config.seed);
    println!("Depth:      {}", config.branch.depth);
    println!("Nodes:      {}", tree.node_count);
    println!("Forks:      {}", tree.fork_count);
    println!("Leaves:     {}", tree.leaves.len());
    println!("Vertices:   {}", mesh.vertex_count());
    println!("Faces:      {}", mesh.face_count());
    println!("Triangles:  {}", mesh.triangle_count());
    if let Some((min, max)) = mesh.bounds() {
        println!(
            "Bounds:     ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    } else {
        warn!("Generated mesh has no vertices");
    }

    println!("Materials:");
    for (index, name) in mesh.materials.iter().enumerate() {
        let faces = mesh
            .faces
            .iter()
            .filter(|f| f.material as usize == index)
            .count();
        println!("  [{}] {:<16} {} faces", index, name, faces);
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_random_seed_shape() {
        let seed = random_seed();
        assert_eq!(seed.len(), SEED_LENGTH);
        assert!(seed.chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn test_cli_parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "arbor",
            "generate",
            "--depth",
            "4",
            "--material",
            "bark",
            "--material",
            "leaf_a",
            "-o",
            "out.glb",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                depth,
                materials,
                output,
                ..
            } => {
                assert_eq!(depth, Some(4));
                assert_eq!(materials, vec!["bark", "leaf_a"]);
                assert_eq!(output, PathBuf::from("out.glb"));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_cli_parses_leaf_geometry() {
        let cli = Cli::try_parse_from(["arbor", "generate", "--leaf-geometry", "Cube"]).unwrap();
        match cli.command {
            Commands::Generate { leaf_geometry, .. } => {
                assert_eq!(leaf_geometry, Some(LeafGeometry::Cube));
            }
            _ => panic!("expected generate"),
        }
        assert!(Cli::try_parse_from(["arbor", "generate", "--leaf-geometry", "sphere"]).is_err());
    }

    #[test]
    fn test_regenerate_seed_requires_config() {
        assert!(Cli::try_parse_from(["arbor", "generate", "--regenerate-seed"]).is_err());
    }

    #[test]
    fn test_missing_custom_leaf_object() {
        let mut config = TreeConfig::default();
        config.leaf.geometry = LeafGeometry::Custom;
        assert!(load_leaf_object(&config).is_err());
        config.leaf.enabled = false;
        assert!(load_leaf_object(&config).unwrap().is_none());
    }
}

use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Parser, Subcommand};
use tilepack::logging::init_tracing;
use tilepack::logging::progress::BuildProgress;
use tilepack::pmtiles::ArchiveReader;
use tilepack::{
    Compression, ProgressTracker, TileConfig, TpError, build_to_file,
    read_features_from_path,
};
use tracing::error;

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, PartialEq, Debug)]
#[command(
    version,
    name = "tilepack",
    about = "Build and inspect single-layer PMTiles vector tile archives",
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=tilepack=debug, and TILEPACK_LOG_FORMAT to pick one of full, compact, bare, pretty or json.",
    styles = HELP_STYLES
)]
pub struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, PartialEq, Debug)]
enum Commands {
    /// Cut GeoJSON features into vector tiles and write them into a new archive
    #[command(name = "build")]
    Build(BuildArgs),
    /// Print the archive header as YAML
    #[command(name = "header")]
    Header {
        /// Archive file to read from
        file: PathBuf,
    },
    /// Print the decompressed archive metadata as JSON
    #[command(name = "meta", alias = "meta-all")]
    Meta {
        /// Archive file to read from
        file: PathBuf,
    },
    /// Report the size of a single tile
    #[command(name = "tile")]
    Tile {
        /// Archive file to read from
        file: PathBuf,
        z: u8,
        x: u32,
        y: u32,
    },
}

#[derive(clap::Args, PartialEq, Debug)]
struct BuildArgs {
    /// GeoJSON file with a feature collection, a feature or a geometry
    input: PathBuf,
    /// Archive file to create, replaced if it already exists
    output: PathBuf,
    /// YAML file with build settings, individual flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Layer name, defaults to the input file name
    #[arg(short, long)]
    layer: Option<String>,
    /// Minimum zoom level to generate
    #[arg(long)]
    min_zoom: Option<u8>,
    /// Maximum zoom level to generate
    #[arg(long)]
    max_zoom: Option<u8>,
    /// Tile extent in units per side
    #[arg(long)]
    extent: Option<u32>,
    /// Compression of tile payloads: none or gzip
    #[arg(long)]
    tile_compression: Option<Compression>,
    /// Compression of the directory and metadata: none or gzip
    #[arg(long)]
    internal_compression: Option<Compression>,
}

impl BuildArgs {
    fn to_config(&self) -> anyhow::Result<TileConfig> {
        let mut config = match &self.config {
            Some(path) => TileConfig::from_path(path)?,
            None => TileConfig::new(default_layer_name(&self.input)),
        };
        if let Some(layer) = &self.layer {
            config.layer.clone_from(layer);
        }
        if let Some(min_zoom) = self.min_zoom {
            config.min_zoom = min_zoom;
        }
        if let Some(max_zoom) = self.max_zoom {
            config.max_zoom = max_zoom;
        }
        if let Some(extent) = self.extent {
            config.extent = extent;
        }
        if let Some(compression) = self.tile_compression {
            config.tile_compression = compression;
        }
        if let Some(compression) = self.internal_compression {
            config.internal_compression = compression;
        }
        Ok(config)
    }
}

fn default_layer_name(input: &Path) -> String {
    input
        .file_stem()
        .map_or_else(|| "layer".to_string(), |s| s.to_string_lossy().to_string())
}

fn main() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "tilepack=info".to_string());
    init_tracing(&filter, std::env::var("TILEPACK_LOG_FORMAT").ok());

    if let Err(err) = main_int() {
        error!("{err}");
        std::process::exit(1);
    }
}

fn main_int() -> anyhow::Result<()> {
    let args = Args::parse();
    match args.command {
        Commands::Build(args) => run_build(&args)?,
        Commands::Header { file } => {
            let data = read_file(&file)?;
            let reader = ArchiveReader::new(&data)?;
            print!("{}", serde_yaml::to_string(reader.header())?);
        }
        Commands::Meta { file } => {
            let data = read_file(&file)?;
            let metadata = ArchiveReader::new(&data)?.metadata()?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Tile { file, z, x, y } => {
            let data = read_file(&file)?;
            match ArchiveReader::new(&data)?.get_tile_zxy(z, x, y)? {
                Some(tile) => println!("Tile {z}/{x}/{y} has {} bytes", tile.len()),
                None => println!("Tile {z}/{x}/{y} is not in the archive"),
            }
        }
    }
    Ok(())
}

fn run_build(args: &BuildArgs) -> anyhow::Result<()> {
    let config = args.to_config()?;
    // settings are checked before spending time on reading the input
    config.validate()?;
    let features = read_features_from_path(&args.input)?;

    let mut bar = BuildProgress::new();
    let mut progress = ProgressTracker::new(&mut bar);
    match build_to_file(&features, &config, &args.output, &mut progress) {
        Ok(size) => {
            bar.finish();
            println!(
                "Wrote {size} bytes with {} features in layer {} to {}",
                features.len(),
                config.layer,
                args.output.display()
            );
            Ok(())
        }
        Err(err) => match progress.last() {
            Some(last) => bail!("{err} (last progress: {last})"),
            None => Err(err.into()),
        },
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, TpError> {
    std::fs::read(path).map_err(|e| TpError::IoError(e, path.to_path_buf()))
}

use anyhow::{Context, Result};
use butterfly_json::{run, Config, Options, PbfSource, RecordSink, RocksStore, TagFilter};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser)]
#[command(author, version, about = "Denormalize OpenStreetMap PBF entities into JSON lines", long_about = None)]
struct Cli {
    /// Input PBF file
    #[arg(value_name = "INPUT_FILE")]
    input: PathBuf,

    /// Tags to match: comma separated groups, '+' joins conditions, 'key' or 'key~value'
    #[arg(short, long, value_name = "TAGS")]
    tags: String,

    /// Coordinate cache directory (default: temporary directory removed on exit)
    #[arg(long, value_name = "DIR")]
    leveldb: Option<PathBuf>,

    /// Cache writes per batch
    #[arg(long, default_value_t = butterfly_json::cache::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Include resolved node coordinates in way records
    #[arg(long)]
    way_nodes: bool,

    /// Index snapshot, read if it exists and written otherwise
    #[arg(long, value_name = "FILE")]
    bitmask: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "OUTPUT_FILE")]
    output: Option<PathBuf>,

    /// Show progress on stderr
    #[arg(long)]
    progress: bool,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let filter: TagFilter = self.tags.parse()?;
        Ok(Config {
            filter,
            options: Options {
                batch_size: self.batch_size,
                way_nodes: self.way_nodes,
                progress: self.progress,
            },
            index_path: self.bitmask.clone(),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = cli.config()?;
    let mut source = PbfSource::open(&cli.input)?;

    // keeps the default cache directory alive until the run is over
    let scratch;
    let cache_dir = match &cli.leveldb {
        Some(dir) => dir.clone(),
        None => {
            scratch = tempfile::Builder::new()
                .prefix("butterfly-json-")
                .tempdir()
                .context("failed to create cache directory")?;
            scratch.path().to_path_buf()
        }
    };
    log::info!("coordinate cache: {}", cache_dir.display());
    let store = RocksStore::open(&cache_dir)?;

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = RecordSink::new(writer);

    let stats = run(&mut source, store, &mut sink, &config)?;
    log::info!("wrote {} records from {}", stats.emitted(), source.path().display());

    Ok(())
}

//! ddigen: generate dispatch tables, loader, layers and null driver
//! sources from a C API specification.
//!
//! - `ddigen generate --api api.yml out/`
//! - `ddigen merge --region factories --base internal.h out/source/loader/*_ldrddi.h`

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ddigen::{merge, Document, GenerateOptions, Mode, Version};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ddigen",
    version,
    about = "Generate C/C++ dispatch sources from a declarative C API specification"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every artifact family for the requested sections
    Generate(GenerateArgs),
    /// Splice the union of a named region across inputs into a base file
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Output directory
    out_dir: PathBuf,

    /// API specification (YAML or JSON). Reads stdin when omitted or `-`.
    #[arg(long)]
    api: Option<PathBuf>,

    /// Skip objects newer than this version
    #[arg(long = "ver", default_value = "1.0")]
    version: String,

    /// Only generate these sections
    #[arg(long, value_delimiter = ',')]
    sections: Option<Vec<String>>,

    #[arg(long)]
    skip_lib: bool,

    #[arg(long)]
    skip_loader: bool,

    #[arg(long)]
    skip_layers: bool,

    #[arg(long)]
    skip_drivers: bool,

    /// What an unresolvable object does to the run
    #[arg(long, value_enum, default_value = "strict")]
    mode: Mode,

    /// Also write generated.json, the list of emitted files
    #[arg(long)]
    debug: bool,
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Input files (glob patterns supported)
    inputs: Vec<String>,

    /// Region name, delimited by `/// <name>` and `/// end <name>`
    #[arg(long)]
    region: String,

    /// File whose region body is replaced
    #[arg(long)]
    base: PathBuf,

    /// Output file (default stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Generate(args) => generate(args),
        Command::Merge(args) => merge_files(args),
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let doc = match args.api.as_deref() {
        Some(path) if path != Path::new("-") => {
            Document::load(path).with_context(|| format!("failed to load {}", path.display()))?
        }
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Document::parse(&input).context("failed to parse specification from stdin")?
        }
    };

    let mut opts = GenerateOptions::new(&args.out_dir);
    opts.version = args
        .version
        .parse::<Version>()
        .with_context(|| format!("invalid --ver: {}", args.version))?;
    opts.sections = args.sections;
    opts.families.lib = !args.skip_lib;
    opts.families.loader = !args.skip_loader;
    opts.families.layers = !args.skip_layers;
    opts.families.drivers = !args.skip_drivers;
    opts.mode = args.mode;
    opts.debug = args.debug;

    if let Some(wanted) = &opts.sections {
        for name in wanted {
            if doc.section(name).is_none() {
                warn!(section = %name, "no such section");
            }
        }
    }

    fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("failed to create output directory: {}", opts.out_dir.display()))?;

    let run = ddigen::run(&doc, &opts).context("generation failed")?;
    if !run.failures.is_empty() {
        for failure in &run.failures {
            error!(path = %run.out_dir().join(&failure.path).display(), error = %failure.error, "artifact failed");
        }
        bail!("{} artifact(s) failed", run.failures.len());
    }
    Ok(())
}

fn merge_files(args: MergeArgs) -> Result<()> {
    let base = fs::read_to_string(&args.base)
        .with_context(|| format!("failed to read {}", args.base.display()))?;

    let mut inputs = Vec::new();
    for path in expand_globs(&args.inputs)? {
        match fs::read_to_string(&path) {
            Ok(text) => inputs.push((path.display().to_string(), text)),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable input"),
        }
    }

    let merged = merge::merge_region(&base, &inputs, &args.region);
    for warning in &merged.warnings {
        warn!("{}", warning);
    }

    match &args.output {
        Some(path) => fs::write(path, &merged.text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout()
            .write_all(merged.text.as_bytes())
            .context("failed to write stdout")?,
    }
    Ok(())
}

/// Header and source extensions scanned when an input is a directory.
const SUPPORTED_EXTENSIONS: &[&str] = &["h", "hpp", "inl", "c", "cpp"];

/// Expand glob patterns into a list of real file paths, in argument order.
/// Also handles bare directory paths by scanning for supported file types.
/// Matches of one directory or glob are sorted; a path seen twice keeps its
/// first position.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut push = |p: PathBuf| {
        if !files.contains(&p) {
            files.push(p);
        }
    };
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            let mut found: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|p| p.is_file())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
                })
                .collect();
            found.sort();
            found.into_iter().for_each(&mut push);
            continue;
        }
        let mut matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            warn!(pattern = %pattern, "no files matched");
        }
        matches.sort();
        matches.into_iter().for_each(&mut push);
    }
    Ok(files)
}

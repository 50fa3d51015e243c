mod report;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flame_tree_core::{Profile, RankedSort, parse_profile_json, to_json};
use flame_tree_protocol::FrameKey;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortBy {
    /// Weight spent in the frame itself
    #[value(name = "self")]
    SelfWeight,
    /// Weight spent in the frame and everything it called
    Total,
    Name,
}

impl From<SortBy> for RankedSort {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::SelfWeight => RankedSort::SelfWeight,
            SortBy::Total => RankedSort::TotalWeight,
            SortBy::Name => RankedSort::Name,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "flame-tree")]
#[command(about = "Inspect a flame-tree interchange profile")]
#[command(version)]
struct Args {
    /// Profile in interchange JSON format
    path: PathBuf,

    /// Column the frame table is sorted by
    #[arg(long, value_enum, default_value = "total")]
    sort: SortBy,

    /// Number of frame table rows
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Collapse recursive calls before anything else
    #[arg(long)]
    flatten: bool,

    /// Show the inverted caller profile of this frame key
    #[arg(long, value_name = "KEY", conflicts_with = "callees")]
    callers: Option<String>,

    /// Show the callee profile of this frame key
    #[arg(long, value_name = "KEY")]
    callees: Option<String>,

    /// Print collapsed stacks in call order instead of the frame table
    #[arg(long)]
    stacks: bool,

    /// Print collapsed stacks of the grouped tree instead of the frame table
    #[arg(long, conflicts_with = "stacks")]
    grouped: bool,

    /// Write the resulting profile as interchange JSON
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

/// Numeric keys address indexed frames; anything else is a name key.
fn parse_key(raw: &str) -> FrameKey {
    raw.parse::<i64>()
        .map_or_else(|_| FrameKey::from(raw), FrameKey::from)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flame_tree=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn derive_profile(args: &Args, mut profile: Profile) -> Result<Profile> {
    if args.flatten {
        profile = profile
            .flatten_recursion()
            .context("failed to flatten recursion")?;
    }
    if let Some(key) = &args.callers {
        profile = profile
            .inverted_profile_for_callers_of(&parse_key(key))
            .with_context(|| format!("failed to invert callers of {key}"))?;
    } else if let Some(key) = &args.callees {
        profile = profile
            .profile_for_callees_of(&parse_key(key))
            .with_context(|| format!("failed to collect callees of {key}"))?;
    }
    Ok(profile)
}

fn run(args: &Args) -> Result<()> {
    let data = std::fs::read(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let profile = parse_profile_json(&data)
        .with_context(|| format!("failed to import {}", args.path.display()))?;
    info!(
        path = %args.path.display(),
        frames = profile.frames().len(),
        samples = profile.samples().len(),
        "loaded profile"
    );

    let profile = derive_profile(args, profile)?;

    let mut out = io::stdout().lock();
    report::write_summary(&mut out, &profile)?;
    writeln!(out)?;
    if args.stacks || args.grouped {
        report::write_stacks(&mut out, &profile, args.grouped)?;
    } else {
        report::write_ranked(&mut out, &profile, args.sort.into(), args.top)?;
    }
    out.flush()?;

    if let Some(path) = &args.export {
        let json = to_json(&profile).context("failed to serialize profile")?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "exported profile");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    run(&Args::parse())
}

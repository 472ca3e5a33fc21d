//! `permalinks` — turn `:placeholder` patterns into permalinks.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

mod config;
mod front_matter;
mod manifest;

use config::Config;
use manifest::Manifest;
use permalinks::{File, Permalinks, util};

#[derive(Parser)]
#[command(name = "permalinks", about = "Render :placeholder permalinks")]
struct Cli {
    /// Config file (default: $PERMALINKS_CONFIG, then ./permalinks.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the Handlebars template a pattern converts to
    Convert { pattern: String },

    /// Format a permalink for one path
    Format {
        /// Pattern or preset name
        pattern: String,
        path: String,
        /// Extra data as key=value; dotted keys nest (site.title=Blog)
        #[arg(long = "local", value_name = "KEY=VALUE")]
        locals: Vec<String>,
    },

    /// Format every matching file under a directory
    Batch {
        dir: PathBuf,
        /// Pattern or preset name (default: `structure` from the config)
        #[arg(long, short)]
        pattern: Option<String>,
        /// Extensions to include, without the dot
        #[arg(long = "ext", default_value = "md")]
        exts: Vec<String>,
        /// Write a JSON manifest instead of printing
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Convert { pattern } => {
            let template = permalinks::convert(&pattern)
                .with_context(|| format!("convert {pattern:?}"))?;
            println!("{template}");
            Ok(())
        }

        Cmd::Format {
            pattern,
            path,
            locals,
        } => {
            let config = Config::load(cli.config.as_deref()).context("load config")?;
            let locals = parse_locals(&locals)?;
            let file = load_file(Path::new(&path), path.clone());
            let link = config
                .permalinks()
                .format(&pattern, &file, &locals)
                .with_context(|| format!("format {path}"))?;
            println!("{link}");
            Ok(())
        }

        Cmd::Batch {
            dir,
            pattern,
            exts,
            out,
        } => {
            let config = Config::load(cli.config.as_deref()).context("load config")?;
            let permalinks = config.permalinks();
            let pattern = pattern.or_else(|| config.structure.clone());
            cmd_batch(&permalinks, &dir, pattern.as_deref(), &exts, out.as_deref())
        }
    }
}

fn cmd_batch(
    permalinks: &Permalinks,
    dir: &Path,
    pattern: Option<&str>,
    exts: &[String],
    out: Option<&Path>,
) -> Result<()> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }

    let none = Map::new();
    let mut manifest = Manifest::default();

    for source in sources_in(dir, exts) {
        let rel = source
            .strip_prefix(dir)
            .unwrap_or(&source)
            .to_string_lossy()
            .replace('\\', "/");
        let file = load_file(&source, rel.clone());

        let link = match pattern {
            Some(p) => permalinks.format(p, &file, &none),
            None => permalinks.format_file(&file, &none),
        }
        .with_context(|| format!("format {rel}"))?;
        manifest.insert(rel, link);
    }

    // Collisions are reported, not fatal.
    for (source, link) in manifest.collisions() {
        log::warn!("{source} maps to {link}, which is already taken");
    }

    match out {
        Some(out) => {
            manifest.write(out).context("write manifest")?;
            log::info!("wrote {} permalinks to {}", manifest.len(), out.display());
        }
        None => {
            for (source, link) in manifest.iter() {
                println!("{source} -> {link}");
            }
        }
    }
    Ok(())
}

/// Files under `dir` whose extension is one of `exts`.
fn sources_in<'a>(dir: &Path, exts: &'a [String]) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(move |e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .and_then(|x| x.to_str())
                    .is_some_and(|x| exts.iter().any(|ext| ext == x))
        })
        .map(|e| e.into_path())
}

/// A `File` for `logical`, with front matter from `disk` when it can be read.
fn load_file(disk: &Path, logical: String) -> File {
    let mut file = File::new(logical);
    if !disk.is_file() {
        return file;
    }

    // Front matter is best-effort: warn and carry on without it.
    let data = fs::read_to_string(disk)
        .with_context(|| format!("read {}", disk.display()))
        .and_then(|src| front_matter::parse(&src));
    match data {
        Ok(data) => *file.data_mut() = data,
        Err(e) => log::warn!("{}: {e:#}", disk.display()),
    }
    file
}

/// `key=value` pairs into a nested map.
fn parse_locals(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut locals = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("expected KEY=VALUE, got {pair:?}");
        };
        anyhow::ensure!(!key.is_empty(), "empty key in {pair:?}");
        util::insert_path(&mut locals, key, Value::String(value.to_owned()));
    }
    Ok(locals)
}

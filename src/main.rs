// Wed Aug 5 2026 - Alex

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use oblivion_spawn_manifest::{
    build_hlil_manifest, compare_manifests, Config, HlilAnalyzer, ManifestWriter, RepoParser,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Spawn manifest extractor and reconciler for the Oblivion game module", long_about = None)]
struct Args {
    /// Primary HLIL dump (split fragments are discovered next to it)
    #[arg(long, default_value = "references/HLIL/oblivion/gamex86.dll_hlil.txt")]
    hlil: PathBuf,

    /// Root of the game source tree
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Compiled binary; defaults to the dump path without its suffix
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Write the combined manifest JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the comparison JSON here
    #[arg(short, long)]
    comparison: Option<PathBuf>,

    /// Pretty-print JSON written to stdout
    #[arg(long)]
    pretty: bool,

    /// Override a source-side constant, e.g. -D OBLIVION_ENABLE_ROTATE_TRAIN=0
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
    defines: Vec<String>,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    no_progress: bool,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if args.verbose { "debug" } else { "warn" },
    ))
    .init();

    let defines = match parse_defines(&args.defines) {
        Ok(defines) => defines,
        Err(e) => {
            eprintln!("{} {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };

    let mut config = Config::new()
        .with_hlil_path(args.hlil.clone())
        .with_repo_root(args.repo.clone());
    if let Some(ref binary) = args.binary {
        config = config.with_binary_path(binary.clone());
    }
    config.defines = defines;

    if let Err(e) = config.validate() {
        eprintln!("{} Invalid configuration: {}", "[!]".red(), e);
        std::process::exit(1);
    }

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_threads)
        .build_global()
        .ok();

    let start_time = Instant::now();
    let progress = if args.no_progress {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        Some(pb)
    };

    eprintln!(
        "{} Loading HLIL corpus: {}",
        "[*]".blue(),
        config.hlil_path.display()
    );
    if let Some(ref pb) = progress {
        pb.set_message("Loading corpus...");
    }

    let defines = config.defines.clone();
    let repo_root = config.repo_root.clone();
    let analyzer = match HlilAnalyzer::new(config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("{} Failed to load HLIL corpus: {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };
    eprintln!(
        "{} Corpus loaded: {} fragments, {} lines",
        "[+]".green(),
        analyzer.corpus().sources().len(),
        analyzer.corpus().lines().len()
    );
    match analyzer.image() {
        Some(image) => eprintln!(
            "{} Binary image mapped: {} sections",
            "[+]".green(),
            image.sections().len()
        ),
        None => eprintln!(
            "{} No binary image, text-only heuristics",
            "[*]".blue()
        ),
    }

    if let Some(ref pb) = progress {
        pb.set_message("Building spawn map...");
    }
    let spawn_entries = analyzer.spawn_map().len();
    eprintln!("{} Spawn map: {} classnames", "[+]".green(), spawn_entries);

    if let Some(ref pb) = progress {
        pb.set_message("Extracting defaults and spawnflags...");
    }
    let hlil_manifest = build_hlil_manifest(&analyzer);

    if let Some(ref pb) = progress {
        pb.set_message("Parsing game sources...");
    }
    let repo_parser = match RepoParser::new(&repo_root, &defines) {
        Ok(parser) => parser,
        Err(e) => {
            eprintln!("{} Failed to parse game sources: {}", "[!]".red(), e);
            std::process::exit(1);
        }
    };
    let repo_manifest = repo_parser.build_manifest();
    eprintln!(
        "{} Source-side map: {} classnames",
        "[+]".green(),
        repo_manifest.len()
    );

    if let Some(ref pb) = progress {
        pb.set_message("Comparing manifests...");
    }
    let comparison = compare_manifests(&hlil_manifest, &repo_manifest);
    eprintln!(
        "{} Comparison: {} missing in repo, {} missing in hlil, {} flag diffs, {} default diffs",
        "[+]".green(),
        comparison.missing_in_repo.len(),
        comparison.missing_in_hlil.len(),
        comparison.spawnflag_mismatches.len(),
        comparison.default_mismatches.len()
    );

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let writer = ManifestWriter::new().with_pretty(args.pretty);
    let combined = writer.combined_document(&hlil_manifest, &repo_manifest);
    let comparison_doc = writer.comparison_document(&comparison);

    if let Err(e) = emit(&writer, &args, combined, comparison_doc) {
        eprintln!("{} Failed to write output: {:#}", "[!]".red(), e);
        std::process::exit(1);
    }

    eprintln!(
        "{} Done in {:.2}s",
        "[+]".green(),
        start_time.elapsed().as_secs_f64()
    );
}

fn emit(
    writer: &ManifestWriter,
    args: &Args,
    combined: serde_json::Value,
    comparison: serde_json::Value,
) -> anyhow::Result<()> {
    if let Some(ref path) = args.output {
        writer
            .write_to_file(&combined, path)
            .with_context(|| format!("writing manifest to {}", path.display()))?;
        eprintln!("{} Manifest written to {}", "[+]".green(), path.display());
    }
    if let Some(ref path) = args.comparison {
        writer
            .write_to_file(&comparison, path)
            .with_context(|| format!("writing comparison to {}", path.display()))?;
        eprintln!("{} Comparison written to {}", "[+]".green(), path.display());
    }
    if args.output.is_none() {
        let document = writer.full_document(combined, comparison);
        writer.write_stdout(&document).context("writing stdout")?;
    }
    Ok(())
}

fn parse_defines(raw: &[String]) -> Result<Vec<(String, String)>, String> {
    raw.iter()
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| format!("invalid define '{}', expected NAME=VALUE", entry))
        })
        .collect()
}

//! Command-line driver: argument parsing, batch traversal, and persistence
//! around the split pipeline.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use exuvia::{
    config::SplitConfig,
    discovery::{DiscoveryOptions, discover_python_files},
    namer::{ChatNameSuggester, PackageNamer, RemoteProvider},
    naming::to_snake,
    orchestrator::{SplitOutcome, split_source, write_package},
};

#[derive(Debug, Parser)]
#[command(
    name = "exuvia",
    version,
    about = "Split single-file Python code into a package of modules (single or batch)."
)]
struct Cli {
    /// .py file(s) or directories to split
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output root directory (default: source file location)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Package name to create for a single file (default: heuristic/remote)
    #[arg(long)]
    pkg_name: Option<String>,

    /// Prefix added to package names in batch mode (e.g. proj_)
    #[arg(long, default_value = "")]
    pkg_prefix: String,

    /// Only print the plan, do not write files
    #[arg(long)]
    dry_run: bool,

    /// Overwrite the output directory if it exists
    #[arg(long)]
    force: bool,

    /// Run in batch mode for directory inputs
    #[arg(long)]
    batch: bool,

    /// Scan subdirectories in batch mode
    #[arg(long)]
    recursive: bool,

    /// Include patterns (glob), repeatable
    #[arg(long = "include")]
    include: Vec<String>,

    /// Exclude patterns (glob), repeatable
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Skip tests/ directories and test files
    #[arg(long)]
    ignore_tests: bool,

    /// Skip files with fewer lines than this (0 = off)
    #[arg(long, default_value_t = 0)]
    min_lines: usize,

    /// TOML file with packing thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable grouping constants into a single module
    #[arg(long)]
    no_group_constants: bool,

    /// Collect modules below this line count into 'core' (0 = off)
    #[arg(long)]
    pack_small_lines: Option<usize>,

    /// Maximum number of modules (merges smallest except constants/core)
    #[arg(long)]
    max_modules: Option<usize>,

    /// Minimum lines per module; merge below this (0 = off)
    #[arg(long)]
    min_module_lines: Option<usize>,

    /// Target module count; merge smallest to reach it
    #[arg(long)]
    target_modules: Option<usize>,

    /// Module-reduction preset: 0 = off, 1 = low, 2 = medium, 3 = aggressive
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
    compact: Option<u8>,

    /// Ask a remote model for the package name
    #[arg(long)]
    ai_name: bool,

    /// Remote provider for --ai-name
    #[arg(long, value_enum)]
    ai_provider: Option<AiProvider>,

    /// Model for --ai-name (e.g. gpt-4o-mini, mistral)
    #[arg(long)]
    ai_model: Option<String>,

    /// Override the provider's API base URL
    #[arg(long)]
    ai_base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AiProvider {
    Openai,
    Ollama,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let any_dirs = cli.inputs.iter().any(|p| p.is_dir());
    if cli.batch || any_dirs || cli.inputs.len() > 1 {
        run_batch(&cli, &config)
    } else {
        let input = &cli.inputs[0];
        if !input.exists() {
            bail!("input not found: {}", input.display());
        }
        process_file(input, cli.pkg_name.as_deref(), &cli, &config)?;
        Ok(())
    }
}

fn run_batch(cli: &Cli, config: &SplitConfig) -> Result<()> {
    let options = DiscoveryOptions {
        recursive: cli.recursive,
        include: cli.include.clone(),
        exclude: cli.exclude.clone(),
        ignore_tests: cli.ignore_tests,
        min_lines: cli.min_lines,
    };

    let mut to_process: Vec<PathBuf> = Vec::new();
    for input in &cli.inputs {
        if input.is_dir() {
            let files = discover_python_files(input, &options)?;
            println!("[i] {}: {} file(s) found.", input.display(), files.len());
            to_process.extend(files);
        } else if input.extension().is_some_and(|ext| ext == "py") {
            to_process.push(input.clone());
        } else {
            println!("[-] skipped (not a .py file): {}", input.display());
        }
    }
    if to_process.is_empty() {
        println!("[!] no files to process.");
        return Ok(());
    }

    let mut ok = 0usize;
    for file in &to_process {
        // Files are independent; one failure does not abort the batch.
        match process_file(file, None, cli, config) {
            Ok(true) => ok += 1,
            Ok(false) => {}
            Err(err) => eprintln!("[!] {}: {err:#}", file.display()),
        }
    }
    println!("\n[ok] batch complete: {ok}/{} succeeded.", to_process.len());
    Ok(())
}

/// Split one file and write (or just plan) its package.
/// Returns false for the non-error "nothing to split" outcome.
fn process_file(
    path: &Path,
    pkg_name: Option<&str>,
    cli: &Cli,
    config: &SplitConfig,
) -> Result<bool> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());

    let namer = build_namer(cli, pkg_name);
    let outcome = split_source(&source, &stem, config, &namer)
        .with_context(|| path.display().to_string())?;
    let SplitOutcome::Package(mut package) = outcome else {
        println!("[-] {}: no top-level definitions, skipping.", path.display());
        return Ok(false);
    };

    if !cli.pkg_prefix.is_empty() {
        package.package_name = to_snake(&format!("{}{}", cli.pkg_prefix, package.package_name));
    }

    println!("\n== Split plan: {} -> {} ==", path.display(), package.package_name);
    for module in &package.modules {
        println!(
            "  - {}: {}  (~{} lines)",
            module.name,
            module.symbols.join(", "),
            module.line_count
        );
    }
    if package.entry.is_some() {
        println!("  - __main__.py: entry-point block will be moved");
    }

    if cli.dry_run {
        return Ok(true);
    }

    let out_root = cli
        .out_dir
        .clone()
        .unwrap_or_else(|| path.parent().unwrap_or(Path::new(".")).to_path_buf());
    let package_dir = write_package(&out_root, &package, cli.force)?;
    println!("[ok] package ready: {}", package_dir.display());
    Ok(true)
}

fn build_config(cli: &Cli) -> Result<SplitConfig> {
    let mut config = match &cli.config {
        Some(path) => SplitConfig::from_file(path)?,
        None => SplitConfig::default(),
    };
    if cli.no_group_constants {
        config.group_constants = false;
    }
    if let Some(value) = cli.pack_small_lines {
        config.pack_small_lines = value;
    }
    if let Some(value) = cli.max_modules {
        config.max_modules = value;
    }
    if let Some(value) = cli.min_module_lines {
        config.min_module_lines = value;
    }
    if let Some(value) = cli.target_modules {
        config.target_modules = Some(value);
    }
    if let Some(level) = cli.compact {
        config.apply_compact(level);
    }
    Ok(config)
}

fn build_namer(cli: &Cli, pkg_name: Option<&str>) -> PackageNamer {
    if let Some(name) = pkg_name {
        return PackageNamer::with_override(name);
    }
    if cli.ai_name
        && let (Some(provider), Some(model)) = (cli.ai_provider, cli.ai_model.as_deref())
    {
        let provider = match provider {
            AiProvider::Openai => RemoteProvider::OpenAi,
            AiProvider::Ollama => RemoteProvider::Ollama,
        };
        return PackageNamer::with_remote(Box::new(ChatNameSuggester::new(
            provider,
            model,
            cli.ai_base_url.as_deref(),
        )));
    }
    PackageNamer::default()
}

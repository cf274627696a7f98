//! tagmeta - Inspect struct metadata derived from tagged class descriptions
//!
//! This tool loads encoded class descriptions, derives Thrift struct
//! metadata for them and prints wiring reports, Thrift IDL or schema
//! fingerprints.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagmeta_core::{
    BuildReport, Catalog, ClassSet, ClassSource, Error as CoreError, GeneratorConfig, IdlConfig, IdlRenderer, StructMetadata,
};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Inspect struct metadata derived from tagged class descriptions
#[derive(Parser, Debug)]
#[command(name = "tagmeta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Folder that relative --file paths are resolved against
    #[arg(long)]
    input_folder: Option<PathBuf>,

    /// Output directory for .thrift files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Class to derive (repeatable; default: every class of the inputs)
    #[arg(long = "class", value_name = "NAME")]
    classes: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Namespace that replaces every declared namespace
    #[arg(long)]
    namespace: Option<String>,

    /// Namespace for classes that declare none
    #[arg(long)]
    default_namespace: Option<String>,

    /// Also write IDL for every struct referenced by a requested class
    #[arg(long)]
    include_referenced: bool,

    /// Treat warnings as failures
    #[arg(long)]
    strict: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry run - don't write files, just show what would be written
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Encoded class description file (repeatable)
    #[arg(short, long)]
    file: Vec<PathBuf>,

    /// Directory to search for *.pb class description files
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Output format for derived metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Wiring report per struct
    Text,
    /// Thrift IDL files in the output directory
    Idl,
    /// Short content hash of the rendered IDL (for scripting)
    Fingerprint,
}

#[derive(Debug, Default)]
struct RunStats {
    built: usize,
    failed: usize,
    warnings: usize,
    written: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let config = generator_config(&cli)?;
    run(&cli, &config)
}

/// Maps the command line onto a validated generator configuration
fn generator_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut builder = GeneratorConfig::builder()
        .output_folder(&cli.output)
        .generate_included(cli.include_referenced);

    if let Some(directory) = &cli.input.directory {
        if !directory.is_dir() {
            bail!("Directory does not exist: {}", directory.display());
        }
        info!("Searching directory: {}", directory.display());
        builder = builder
            .input_folder(directory)
            .input_files(find_descriptions(directory));
    } else {
        if let Some(folder) = &cli.input_folder {
            builder = builder.input_folder(folder);
        }
        builder = builder.input_files(&cli.input.file);
    }
    if let Some(namespace) = &cli.namespace {
        builder = builder.override_namespace(namespace);
    }
    if let Some(namespace) = &cli.default_namespace {
        builder = builder.default_namespace(namespace);
    }

    builder.build().context("Invalid configuration")
}

/// Finds `*.pb` files below `directory`, relative to it and sorted
fn find_descriptions(directory: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("pb"))
        .filter_map(|entry| entry.path().strip_prefix(directory).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    trace!("Found {} description files", files.len());
    files
}

/// Decodes and merges every input file into one class set
fn load_classes(config: &GeneratorConfig) -> Result<ClassSet> {
    let mut classes = ClassSet::new();
    for path in config.resolved_inputs() {
        trace!("Reading {}", path.display());
        let data = fs::read(&path).map_err(|e| CoreError::file_read(&path, e))?;
        let set = ClassSet::decode(data.as_slice())
            .with_context(|| format!("Failed to decode class descriptions: {}", path.display()))?;
        debug!("Loaded {} classes from {}", set.len(), path.display());
        classes
            .merge(set)
            .with_context(|| format!("Failed to merge classes from {}", path.display()))?;
    }
    Ok(classes)
}

fn run(cli: &Cli, config: &GeneratorConfig) -> Result<()> {
    let classes = load_classes(config)?;

    let targets: Vec<String> = if cli.classes.is_empty() {
        // Builder classes are only ever reached through the struct they build
        let builders: HashSet<String> = classes
            .names()
            .filter_map(|name| classes.class(name))
            .filter_map(|class| class.builder.clone())
            .collect();
        classes
            .names()
            .filter(|name| !builders.contains(*name))
            .map(str::to_string)
            .collect()
    } else {
        for name in &cli.classes {
            if classes.class(name).is_none() {
                return Err(CoreError::unknown_class(name.as_str()).into());
            }
        }
        cli.classes.clone()
    };
    if targets.is_empty() {
        bail!("No classes found in the inputs");
    }

    let catalog = Catalog::new(classes);
    let mut stats = RunStats::default();
    let mut written = HashSet::new();
    let mut outputs = HashMap::new();

    for class in &targets {
        let report = catalog.build_report(class);
        let Some(metadata) = check_report(cli, class, &report, &mut stats) else {
            continue;
        };

        match cli.format {
            OutputFormat::Text => print!("{}", describe(&metadata)),
            OutputFormat::Fingerprint => {
                let idl = renderer(config, &metadata).render(&metadata);
                println!("{}  {}", content_hash(&idl), metadata.class());
            }
            OutputFormat::Idl => {
                let mut pending = vec![metadata];
                while let Some(metadata) = pending.pop() {
                    if !written.insert(metadata.class().to_string()) {
                        continue;
                    }
                    if config.generate_included() {
                        pending.extend(referenced(&catalog, &metadata));
                    }
                    emit_idl(cli, config, &metadata, &mut outputs, &mut stats)?;
                }
            }
        }
    }

    info!(
        "Summary: {} built, {} failed, {} warnings, {} written",
        stats.built, stats.failed, stats.warnings, stats.written
    );
    if stats.failed > 0 {
        bail!("{} of {} classes failed", stats.failed, targets.len());
    }
    Ok(())
}

/// Logs the diagnostics of a build and returns the metadata if it counts as
/// a success
fn check_report(cli: &Cli, class: &str, report: &BuildReport, stats: &mut RunStats) -> Option<Arc<StructMetadata>> {
    for diagnostic in report.diagnostics.iter() {
        if diagnostic.is_error() {
            error!("{}", diagnostic);
        } else {
            warn!("{}", diagnostic);
        }
    }
    let warnings = report.diagnostics.warnings().len();
    stats.warnings += warnings;

    match &report.metadata {
        Some(_) if cli.strict && warnings > 0 => {
            error!("{}: {} warnings with --strict", class, warnings);
            stats.failed += 1;
            None
        }
        Some(metadata) => {
            stats.built += 1;
            Some(Arc::clone(metadata))
        }
        None => {
            stats.failed += 1;
            None
        }
    }
}

/// Published structs referenced by the fields of `metadata`
fn referenced(catalog: &Catalog, metadata: &StructMetadata) -> Vec<Arc<StructMetadata>> {
    metadata
        .fields()
        .flat_map(|field| field.struct_links())
        .filter_map(|link| catalog.resolve(link))
        .collect()
}

fn renderer(config: &GeneratorConfig, metadata: &StructMetadata) -> IdlRenderer {
    let declared = metadata.class().rsplit_once('.').map(|(namespace, _)| namespace);
    let namespace = config.namespace_for(declared);
    IdlRenderer::with_config(IdlConfig::new().namespace(namespace))
}

/// Renders and writes one struct. `outputs` maps each path written in this
/// run to its class, so two classes with the same simple name are rejected
/// instead of overwriting each other.
fn emit_idl(
    cli: &Cli,
    config: &GeneratorConfig,
    metadata: &StructMetadata,
    outputs: &mut HashMap<PathBuf, String>,
    stats: &mut RunStats,
) -> Result<()> {
    let content = renderer(config, metadata).render(metadata);
    let output_path = config.output_folder().join(IdlRenderer::file_name(metadata));

    if let Some(previous) = outputs.insert(output_path.clone(), metadata.class().to_string()) {
        bail!(
            "Classes '{}' and '{}' both map to {}",
            previous,
            metadata.class(),
            output_path.display()
        );
    }

    if cli.dry_run {
        println!("Would write: {}", output_path.display());
        if cli.verbose > 0 {
            println!("---");
            print!("{}", content);
            println!("---");
        }
        return Ok(());
    }

    write_idl_file(&output_path, &content, cli.force)?;
    println!("Wrote {}", output_path.display());
    stats.written += 1;
    Ok(())
}

/// Compute a short hash of the content (first 8 chars of blake3)
fn content_hash(content: &str) -> String {
    let hash = blake3::hash(content.as_bytes());
    hash.to_hex()[..8].to_string()
}

/// Human readable wiring report of one struct
fn describe(metadata: &StructMetadata) -> String {
    let mut out = format!("struct {} ({} strategy)\n", metadata.class(), metadata.strategy());
    out.push_str(&format!("  constructor: {}\n", metadata.constructor().owner()));
    if let Some(builder) = metadata.builder() {
        out.push_str(&format!("  builder: {} via {}\n", builder.class(), builder.factory()));
    }

    for field in metadata.fields() {
        let requiredness = match field.requiredness().as_str() {
            "" => String::new(),
            keyword => format!(" {}", keyword),
        };
        out.push_str(&format!("  {}: {} {}{}\n", field.id(), field.ty(), field.name(), requiredness));
        out.push_str(&format!("    read:  {}\n", field.extraction()));
        for injection in field.injections() {
            out.push_str(&format!("    write: {}\n", injection));
        }
        for link in field.struct_links().iter().filter(|l| l.is_deferred()) {
            out.push_str(&format!("    cycle: {}\n", link.class()));
        }
    }

    for setter in metadata.method_injections() {
        let ids: Vec<String> = setter.parameters().iter().map(|p| p.id.to_string()).collect();
        out.push_str(&format!("  setter: {}({})\n", setter.method(), ids.join(", ")));
    }
    out
}

/// Write an IDL file, refusing to replace an existing one unless forced
fn write_idl_file(output_path: &Path, content: &str, force: bool) -> Result<()> {
    // Create parent directories
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            output_path.display()
        );
    }

    let mut file = fs::File::create(output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", output_path.display()))?;

    Ok(())
}

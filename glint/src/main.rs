use clap::{Parser, Subcommand};
use glint_core::{
    compile, CompileOptions, Compiler, CompilerError, Diagnostic, DiagnosticRenderer, OutputFormat, SourceFile,
};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "glint")]
#[command(about = "Compiler for the glint shading language, targeting WGSL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to WGSL
    Compile {
        /// Input source file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output WGSL file (defaults to input name with .wgsl extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write entry point, uniform and struct metadata as JSON
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,

        /// Write a source map as JSON
        #[arg(long, value_name = "FILE")]
        source_map: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,

        /// Disable constant folding
        #[arg(long)]
        no_fold: bool,

        /// Disable dead-code elimination
        #[arg(long)]
        no_dce: bool,
    },

    /// Validate a source file without generating output
    Check {
        /// Input source file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print analysis metadata as JSON on stdout
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// JSON file with compile options
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,

    /// Diagnostic output format: terminal, plain or html
    #[arg(long, default_value = "terminal")]
    format: OutputFormat,

    /// Lines of source context around each diagnostic
    #[arg(long, default_value_t = 2)]
    context: usize,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Compilation error: {0}")]
    CompilationError(#[from] CompilerError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid options file {}: {source}", path.display())]
    OptionsError { path: PathBuf, source: serde_json::Error },

    #[error("{0} error(s) in {1}")]
    SourceErrors(usize, String),
}

fn main() -> Result<(), DriverError> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            metadata,
            source_map,
            common,
            no_fold,
            no_dce,
        } => {
            let mut options = load_options(&common)?;
            options.source_maps |= source_map.is_some();
            if no_fold {
                options.optimizations.constant_folding = false;
            }
            if no_dce {
                options.optimizations.dead_code_elimination = false;
            }
            compile_file(&input, output, metadata, source_map, &options, &common)?;
        }
        Commands::Check { input, json, common } => {
            let options = load_options(&common)?;
            check_file(&input, json, &options, &common)?;
        }
    }

    Ok(())
}

fn load_options(common: &CommonArgs) -> Result<CompileOptions, DriverError> {
    let mut options = match &common.options {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(|source| DriverError::OptionsError {
                path: path.clone(),
                source,
            })?
        }
        None => CompileOptions::default(),
    };
    options.strict_mode |= common.strict;
    Ok(options)
}

fn report<'a>(
    diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
    source: &SourceFile,
    common: &CommonArgs,
) -> Result<(), DriverError> {
    let renderer = DiagnosticRenderer::new(common.context).with_color(!common.no_color);
    let rendered = renderer.render_all(diagnostics, source, common.format)?;
    if !rendered.is_empty() {
        eprint!("{}", rendered);
    }
    Ok(())
}

fn compile_file(
    input: &Path,
    output: Option<PathBuf>,
    metadata: Option<PathBuf>,
    source_map: Option<PathBuf>,
    options: &CompileOptions,
    common: &CommonArgs,
) -> Result<(), DriverError> {
    if common.verbose {
        info!("Compiling {}...", input.display());
    }

    let text = fs::read_to_string(input)?;
    let name = input.display().to_string();
    let result = compile(&text, &name, options)?;
    report(&result.diagnostics, &SourceFile::new(name.as_str(), text.as_str()), common)?;

    if result.has_errors() {
        let count = result.diagnostics.iter().filter(|d| d.is_error()).count();
        return Err(DriverError::SourceErrors(count, name));
    }

    let output_path = output.unwrap_or_else(|| input.with_extension("wgsl"));
    fs::write(&output_path, &result.code)?;

    if let Some(path) = metadata {
        fs::write(&path, serde_json::to_string_pretty(&result.metadata)?)?;
        if common.verbose {
            info!("Wrote metadata to {}", path.display());
        }
    }
    if let (Some(path), Some(map)) = (source_map, &result.source_map) {
        fs::write(&path, serde_json::to_string_pretty(map)?)?;
        if common.verbose {
            info!("Wrote source map to {}", path.display());
        }
    }

    if common.verbose {
        info!("Successfully compiled to {}", output_path.display());
        info!(
            "{} entry point(s), {} uniform(s)",
            result.metadata.entry_points.len(),
            result.metadata.uniforms.len()
        );
    }

    Ok(())
}

fn check_file(input: &Path, json: bool, options: &CompileOptions, common: &CommonArgs) -> Result<(), DriverError> {
    if common.verbose {
        info!("Checking {}...", input.display());
    }

    let text = fs::read_to_string(input)?;
    let name = input.display().to_string();
    let analyzed = Compiler::parse(&text, &name).analyze(options);
    report(
        analyzed.diagnostics().iter().chain(analyzed.hints()),
        analyzed.source(),
        common,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(analyzed.metadata())?);
    }

    if analyzed.has_errors() {
        let count = analyzed.diagnostics().iter().filter(|d| d.is_error()).count();
        return Err(DriverError::SourceErrors(count, name));
    }

    if common.verbose {
        let meta = analyzed.metadata();
        info!(
            "{} is valid: {} function(s), {} entry point(s), estimated register pressure {}",
            name, meta.function_count, meta.entry_point_count, meta.register_pressure
        );
    }

    Ok(())
}

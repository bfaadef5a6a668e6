//! Minimal CLI: schema files → (descriptor | diagnostics)
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use rule_shape::{emit, CompileErrors, Compiler, CompilerConfig, Schema, TypeDescriptor};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// derive the shape of validated request data from flat validation-rule schemas
#[derive(Parser, Debug)]
#[command(name = "rule-shape", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile schemas and print the inferred shape
    Infer(InferOut),
    /// compile schemas and only report errors
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// compiler config (catalog extensions, policy) as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// JQ filter selecting the schema object(s) inside each document
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    /// JSON-Schema-ish descriptor
    #[default]
    Json,
    /// TypeScript-like type expression
    Type,
}

#[derive(clap::Parser, Debug)]
struct InferOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,
}

/// One schema to compile, labelled for diagnostics (`file` or `file#2`).
struct Input {
    label: String,
    schema: Schema,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn compiler(&self) -> Result<Compiler> {
        match &self.config {
            None => Ok(Compiler::default()),
            Some(path) => {
                let config = CompilerConfig::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?;
                Ok(Compiler::from_config(&config))
            }
        }
    }

    fn load(&self) -> Result<Vec<Input>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let json_value = serde_json::from_str::<serde_json::Value>(&source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            let documents = match self.jq_expr.as_ref() {
                None => vec![json_value],
                Some(jq_expr) => crate::jq_exec::select(jq_expr, &json_value)
                    .with_context(|| format!("failed to apply jq expression to ({source_path_str})"))?,
            };
            let many = documents.len() > 1;
            for (i, document) in documents.into_iter().enumerate() {
                let label = if many { format!("{source_path_str}#{i}") } else { source_path_str.clone() };
                let schema = Schema::from_value(document)
                    .with_context(|| format!("invalid schema document ({label})"))?;
                out.push(Input { label, schema });
            }
        }
        tracing::info!(inputs = out.len(), "loaded schemas");
        Ok(out)
    }
}

/// Independent schemas compile in parallel; results keep input order.
fn compile_all(compiler: &Compiler, inputs: &[Input]) -> Vec<Result<TypeDescriptor, CompileErrors>> {
    inputs.par_iter().map(|input| compiler.compile(&input.schema)).collect()
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(false)` when some schema failed to compile.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Infer(target) => {
                let compiler = target.input_settings.compiler()?;
                let inputs = target.input_settings.load()?;
                let results = compile_all(&compiler, &inputs);

                let mut ok = true;
                let mut compiled = Vec::new();
                for (input, result) in inputs.iter().zip(results) {
                    match result {
                        Ok(d) => compiled.push((input.label.as_str(), d)),
                        Err(errors) => {
                            ok = false;
                            report(&input.label, &errors);
                        }
                    }
                }

                let rendered = render_output(&compiled, target.format, inputs.len() > 1)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {}", parent.display()))?;
                    }
                    std::fs::write(out, &rendered)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                } else if !rendered.is_empty() {
                    println!("{rendered}");
                }
                Ok(ok)
            }
            Command::Check(target) => {
                let compiler = target.input_settings.compiler()?;
                let inputs = target.input_settings.load()?;
                if inputs.is_empty() {
                    bail!("no schemas to check");
                }
                let mut ok = true;
                for (input, result) in inputs.iter().zip(compile_all(&compiler, &inputs)) {
                    match result {
                        Ok(_) => eprintln!("{} {}", "ok".green().bold(), input.label),
                        Err(errors) => {
                            ok = false;
                            report(&input.label, &errors);
                        }
                    }
                }
                Ok(ok)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn render_output(compiled: &[(&str, TypeDescriptor)], format: OutputFormat, labelled: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Json if labelled => {
            let map = compiled
                .iter()
                .map(|(label, d)| (label.to_string(), emit::to_json(d)))
                .collect::<serde_json::Map<_, _>>();
            serde_json::to_string_pretty(&map)?
        }
        OutputFormat::Json => match compiled.first() {
            Some((_, d)) => serde_json::to_string_pretty(&emit::to_json(d))?,
            None => String::new(),
        },
        OutputFormat::Type => compiled
            .iter()
            .map(|(label, d)| match labelled {
                true => format!("// {label}\n{}", emit::render_pretty(d)),
                false => emit::render_pretty(d),
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
    })
}

fn report(label: &str, errors: &CompileErrors) {
    eprintln!("{} {} ({} error{})", "error:".red().bold(), label, errors.len(), if errors.len() == 1 { "" } else { "s" });
    for e in errors.iter() {
        eprintln!("  {} {e}", "-".dimmed());
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

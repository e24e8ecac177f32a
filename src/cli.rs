//! CLI: schema documents → (markup | validator listing)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use serde_json::Value;
use tracing::info;

use schema_markup::ir::SchemaModel;
use schema_markup::markup::Element;
use schema_markup::registry::ValidatorRegistry;
use schema_markup::{docstring, jq_exec, json_schema, lower, path_de};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile typed schema models into the markup tree consumed by the prompt/validation engine
#[derive(Parser, Debug)]
#[command(name = "schema-markup", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile every input model and print its markup
    Markup(MarkupOut),
    /// list the validators of every input model (and nested record) by field and rule alias
    Validators(ValidatorsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON), one document per line
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /definitions/Person)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one model
    #[arg(long)]
    jq_expr: Option<String>,

    /// documents are JSON Schema objects rather than native schema models
    #[arg(long, default_value_t = false)]
    from_json_schema: bool,

    /// do not fill missing field descriptions from the model's `Args:` documentation
    #[arg(long, default_value_t = false)]
    no_doc_descriptions: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Xml,
    Json,
}

#[derive(clap::Parser, Debug)]
struct MarkupOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output encoding of the markup tree
    #[arg(long, value_enum, default_value_t = OutputFormat::Xml)]
    format: OutputFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct ValidatorsOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One model plus where it came from, for error messages.
#[derive(Debug)]
struct LoadedModel {
    source: String,
    model: SchemaModel,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_models(&self) -> Result<Vec<LoadedModel>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;

            let parsed: Result<Vec<Value>, serde_json::Error> = if self.ndjson {
                source
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(serde_json::from_str::<Value>)
                    .collect()
            } else {
                serde_json::from_str::<Value>(&source).map(|v| vec![v])
            };
            let documents = parsed
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;

            let before = out.len();
            for document in documents {
                for selected in self.select(document, &source_path_str)? {
                    let model = self
                        .to_model(selected)
                        .with_context(|| format!("invalid schema document in {source_path_str}"))?;
                    out.push(LoadedModel { source: source_path_str.clone(), model });
                }
            }
            info!(path = %source_path_str, models = out.len() - before, "loaded schema documents");
        }
        Ok(out)
    }

    fn select(&self, document: Value, source_path_str: &str) -> Result<Vec<Value>> {
        let document = match self.json_pointer.as_deref() {
            None => document,
            Some(pointer) => match document.pointer(pointer) {
                Some(node) => node.clone(),
                None => bail!("JSON pointer {pointer} matched nothing in {source_path_str}"),
            },
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![document]),
            Some(jq_expr) => jq_exec::select_documents(jq_expr, &document).with_context(|| {
                format!("failed to apply jq expression to source file ({source_path_str})")
            }),
        }
    }

    fn to_model(&self, document: Value) -> Result<SchemaModel> {
        let mut model = if self.from_json_schema {
            json_schema::model_from_json_schema(&document)?
        } else {
            path_de::from_value_with_path::<SchemaModel>(document)?
        };
        if !self.no_doc_descriptions {
            docstring::fill_descriptions(&mut model);
        }
        Ok(model)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(self) -> Result<()> {
        match &self.cmd {
            Command::Markup(target) => {
                // 1) load models
                let models = target.input_settings.load_models()?;

                // 2) compile; models are independent so this fans out
                let elements = models
                    .par_iter()
                    .map(|loaded| {
                        lower::compile(&loaded.model).with_context(|| {
                            format!(
                                "cannot compile model `{}` from {}",
                                loaded.model.name, loaded.source
                            )
                        })
                    })
                    .collect::<Result<Vec<Element>>>()?;

                // 3) render
                let rendered = match target.format {
                    OutputFormat::Xml => elements
                        .iter()
                        .map(Element::to_xml)
                        .collect::<Vec<_>>()
                        .join("\n"),
                    OutputFormat::Json => match elements.as_slice() {
                        [single] => serde_json::to_string_pretty(single)?,
                        many => serde_json::to_string_pretty(many)?,
                    },
                };
                emit(target.out.as_deref(), &rendered)
            }
            Command::Validators(target) => {
                let models = target.input_settings.load_models()?;
                let mut registry = ValidatorRegistry::new();
                for loaded in &models {
                    registry.register(&loaded.model);
                }
                let listing = serde_json::to_string_pretty(&registry)?;
                emit(target.out.as_deref(), &listing)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn emit(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "wrote output");
        }
        None => {
            let text = text.strip_suffix('\n').unwrap_or(text);
            println!("{text}");
        }
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }

        let before = out.len();
        for entry in glob::glob(pattern)? {
            out.push(entry?);
        }
        if out.len() == before {
            // An explicit glob that matched nothing is surfaced as an error.
            bail!("glob pattern matched no files: {pattern}");
        }
    }

    Ok(out)
}

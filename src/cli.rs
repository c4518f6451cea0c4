//! Minimal CLI: descriptors → (schema | template)
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::builder::{release_descriptors, Session};
use crate::descriptor::ModuleDesc;
use crate::emit;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build invocation artifacts from upstream type-descriptor dumps
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// build each module and emit the declarative UI schema
    Schema(ArtifactOut),
    /// build each module and emit the flat template property maps
    Template(ArtifactOut),
}

#[derive(Args, Debug, Clone)]
struct ArtifactOut {
    /// One or more module descriptor files. May be literal paths or quoted
    /// glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => target.emit(|session| {
                let mut model = session.finish()?;
                let functions: Vec<serde_json::Value> = model
                    .functions
                    .iter_mut()
                    .map(|f| {
                        let schema = emit::ui_schema(f);
                        release_descriptors(f);
                        schema
                    })
                    .collect();
                Ok(json!({ "module": model.name, "functions": functions }))
            }),
            Command::Template(target) => target.emit(|session| {
                let mut model = session.finish()?;
                let functions: Vec<serde_json::Value> = model
                    .functions
                    .iter_mut()
                    .map(|f| {
                        let props = emit::template_properties(f);
                        let rendered = json!({
                            "name": f.name,
                            "dispatch": f.dispatch_name(),
                            "parameterCount": f.params.len(),
                            "properties": props,
                        });
                        release_descriptors(f);
                        rendered
                    })
                    .collect();
                Ok(json!({ "module": model.name, "functions": functions }))
            }),
        }
    }
}

impl ArtifactOut {
    fn emit(&self, render: impl Fn(&mut Session) -> Result<serde_json::Value>) -> Result<()> {
        let mut artifacts = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let source = std::fs::read_to_string(&source_path).with_context(|| {
                format!("failed to read descriptor file {}", source_path.display())
            })?;
            let module: ModuleDesc = from_str_with_path(&source)
                .map_err(|e| anyhow!("{}: {e}", source_path.display()))?;

            // One session per descriptor file; the reset between files is
            // what keeps independent builds isolated.
            let mut session = Session::new();
            session.begin(&module.module)?;
            for function in &module.functions {
                session.add_function(function)?;
            }
            artifacts.push(render(&mut session)?);
            session.reset();
        }

        let rendered = serde_json::to_string_pretty(&serde_json::Value::Array(artifacts))?;
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(out, &rendered)?;
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
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
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // An explicit glob that matches nothing -> surface as an error
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

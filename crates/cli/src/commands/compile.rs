use std::path::Path;
use std::process;

use rulebook_codegen::SqlGenerator;
use rulebook_core::{MemoryResolver, NoResolver, RuleResolver};

use super::validate::{report_semantic_errors, run_validation};
use super::{load_rule_or_exit, resolver_or_exit};
use crate::config::Config;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_compile(
    rule_path: &Path,
    rules_dir: Option<&Path>,
    skip_validation: bool,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) {
    let (catalogs, dialect) = match config.catalogs().and_then(|c| Ok((c, config.dialect()?))) {
        Ok(pair) => pair,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let rule = load_rule_or_exit(rule_path, output, quiet);
    let store: Option<MemoryResolver> = resolver_or_exit(config.rules_dir(rules_dir), output, quiet);

    if !skip_validation {
        let errors = run_validation(&rule, &catalogs, store.as_ref());
        if !errors.is_empty() {
            report_semantic_errors(&errors, output, quiet);
            process::exit(1);
        }
    }

    let resolver: &dyn RuleResolver = match &store {
        Some(s) => s,
        None => &NoResolver,
    };
    let generator = SqlGenerator::new(&catalogs, &dialect, resolver)
        .with_max_references(config.max_references());

    match generator.compile(&rule) {
        Ok(sql) => {
            if !quiet {
                match output {
                    OutputFormat::Text => println!("{}", sql),
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({ "sql": sql }))
                            .unwrap_or_default()
                    ),
                }
            }
        }
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    eprintln!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({ "error": e }))
                            .unwrap_or_default()
                    );
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("compile error: {}", e);
                    }
                }
            }
            process::exit(1);
        }
    }
}

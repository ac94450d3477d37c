use std::path::Path;
use std::process;

use rulebook_core::{Catalogs, MemoryResolver, Rule, SemanticError, Validator};

use super::{load_rule_or_exit, resolver_or_exit};
use crate::config::Config;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_validate(
    rule_path: &Path,
    rules_dir: Option<&Path>,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) {
    let catalogs = match config.catalogs() {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let rule = load_rule_or_exit(rule_path, output, quiet);
    let store = resolver_or_exit(config.rules_dir(rules_dir), output, quiet);

    let errors = run_validation(&rule, &catalogs, store.as_ref());
    if errors.is_empty() {
        if !quiet {
            match output {
                OutputFormat::Text => println!("valid"),
                OutputFormat::Json => println!("{}", serde_json::json!({"valid": true, "errors": []})),
            }
        }
    } else {
        report_semantic_errors(&errors, output, quiet);
        process::exit(1);
    }
}

pub(crate) fn run_validation(
    rule: &Rule,
    catalogs: &Catalogs,
    store: Option<&MemoryResolver>,
) -> Vec<SemanticError> {
    let validator = Validator::new(catalogs);
    match store {
        Some(s) => validator.with_resolver(s).validate(rule),
        None => validator.validate(rule),
    }
}

/// JSON output is produced even under `--quiet`.
pub(crate) fn report_semantic_errors(errors: &[SemanticError], output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid: {} error(s)", errors.len());
                for err in errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": false,
                "errors": errors
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
}

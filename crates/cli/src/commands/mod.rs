pub(crate) mod catalog;
pub(crate) mod compile;
pub(crate) mod validate;

use std::path::{Path, PathBuf};
use std::process;

use rulebook_core::{MemoryResolver, Rule};

use crate::{report_error, OutputFormat};

/// Read and parse a rule file, exiting with status 1 on failure.
pub(crate) fn load_rule_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> Rule {
    match read_rule(path) {
        Ok(rule) => rule,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

pub(crate) fn read_rule(path: &Path) -> Result<Rule, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    Rule::from_json_str(&content)
        .map_err(|e| format!("error parsing rule in '{}': {}", path.display(), e))
}

/// Load every `*.json` rule in `dir` into a resolver.
pub(crate) fn load_rules_dir(dir: &Path) -> Result<MemoryResolver, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("error reading rules directory '{}': {}", dir.display(), e))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "json"))
        .collect();
    paths.sort();

    let mut store = MemoryResolver::new();
    for path in &paths {
        let rule = read_rule(path)?;
        let replaced = store
            .insert(rule)
            .map_err(|e| format!("error storing rule from '{}': {}", path.display(), e))?;
        if let Some(previous) = replaced {
            tracing::warn!(
                file = %path.display(),
                id = %previous.id,
                version = previous.version,
                "stored rule replaced by a later file with the same uuid and version"
            );
        }
    }
    tracing::debug!(dir = %dir.display(), rules = store.len(), "loaded stored rules");
    Ok(store)
}

/// Resolver for the effective rules directory, or an empty one.
pub(crate) fn resolver_or_exit(
    dir: Option<PathBuf>,
    output: OutputFormat,
    quiet: bool,
) -> Option<MemoryResolver> {
    let dir = dir?;
    match load_rules_dir(&dir) {
        Ok(store) => Some(store),
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

use std::process;

use crate::config::Config;
use crate::{report_error, OutputFormat};

/// Catalogs are JSON in either output mode.
pub(crate) fn cmd_catalog(functions_only: bool, config: &Config, output: OutputFormat, quiet: bool) {
    let catalogs = match config.catalogs() {
        Ok(c) => c,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    let rendered = if functions_only {
        serde_json::to_string_pretty(&catalogs.functions)
    } else {
        serde_json::to_string_pretty(&catalogs)
    };
    match rendered {
        Ok(s) => println!("{}", s),
        Err(e) => {
            report_error(&format!("serialization error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

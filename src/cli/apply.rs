//! Apply command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::args::ApplyArgs;
use super::common::{display_name, load_session, plural_count, write_output};
use svgtint::{EditRequest, debug, log};

pub fn run(args: &ApplyArgs) -> Result<()> {
    let mut session = load_session(&args.input.file)?;
    let request = build_request(args)?;

    if request.is_empty() {
        log!("warn"; "no edits given, writing the input unchanged");
    }
    debug!(
        "apply";
        "{}, {}",
        plural_count(request.colors.len(), "group edit"),
        plural_count(request.stops.len(), "stop edit")
    );

    session
        .apply(&request)
        .with_context(|| format!("failed to apply edits to {}", display_name(&args.input.file)))?;

    write_output(session.markup(), args.output.as_deref())
}

/// Edits from `--edits`, then `--set` (overriding the file per key) and `--stop`.
fn build_request(args: &ApplyArgs) -> Result<EditRequest> {
    let mut request = match &args.edits {
        Some(path) => read_edits(path)?,
        None => EditRequest::new(),
    };
    for (key, value) in &args.set {
        request = request.recolor(key.clone(), value.clone());
    }
    request.stops.extend(args.stops.iter().cloned());
    Ok(request)
}

/// `.json` files are JSON, anything else TOML.
fn read_edits(path: &Path) -> Result<EditRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read edits from `{}`", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let request = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON edits in `{}`", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("invalid TOML edits in `{}`", path.display()))?
    };
    Ok(request)
}

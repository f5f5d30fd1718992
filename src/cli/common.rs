//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use svgtint::{Session, log};

/// Read a file, or stdin for `-`.
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("failed to read SVG from stdin")?;
        return Ok(content);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
}

/// Read and parse the input document, warning about missing namespaces.
pub fn load_session(path: &Path) -> Result<Session> {
    let markup = read_input(path)?;
    let session = Session::load(&markup)
        .with_context(|| format!("`{}` is not a usable SVG document", display_name(path)))?;

    for issue in session.document().namespace_issues() {
        log!("warn"; "{}: {}", display_name(path), issue);
    }
    Ok(session)
}

/// Write `text` to `output`, or stdout when no path is given.
pub fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write `{}`", path.display()))?;
            log!("apply"; "wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

pub fn display_name(path: &Path) -> String {
    if path == Path::new("-") {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

/// `1 group`, `3 groups`
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "group"), "0 groups");
        assert_eq!(plural_count(1, "stop"), "1 stop");
        assert_eq!(plural_count(2, "member"), "2 members");
    }

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.svg");
        fs::write(&path, "<svg/>").unwrap();
        assert_eq!(read_input(&path).unwrap(), "<svg/>");
        assert!(read_input(&dir.path().join("missing.svg")).is_err());
    }

    #[test]
    fn test_load_session_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.svg");
        fs::write(&path, "<svg><g></svg>").unwrap();
        let err = load_session(&path).unwrap_err();
        assert!(err.to_string().contains("broken.svg"));
    }

    #[test]
    fn test_write_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        write_output("<svg/>", Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg/>");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("-")), "<stdin>");
        assert_eq!(display_name(Path::new("a.svg")), "a.svg");
    }
}

//! Inspect command implementation.
//!
//! Prints the color groups and gradients of one document, as a table or JSON.

use std::fmt::Write as _;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};
use serde_json::json;

use super::args::InspectArgs;
use super::common::{display_name, load_session, plural_count, to_json};
use svgtint::config::Config;
use svgtint::{ColorKey, ElementColorMap, GradientTable, log};

pub fn run(args: &InspectArgs, config: &Config) -> Result<()> {
    let session = load_session(&args.input.file)?;
    let colors = session.colors();
    let gradients = session.gradients();

    if args.json {
        let issues: Vec<String> = session
            .document()
            .namespace_issues()
            .iter()
            .map(ToString::to_string)
            .collect();
        let report = json!({
            "colors": colors,
            "gradients": gradients,
            "namespace_issues": issues,
        });
        println!("{}", to_json(&report, config.output.pretty)?);
        return Ok(());
    }

    log!(
        "inspect";
        "{}: {}, {}",
        display_name(&args.input.file),
        plural_count(colors.len(), "color group"),
        plural_count(gradients.len(), "gradient")
    );
    print!("{}", render(colors, gradients, args.members || config.inspect.members));
    Ok(())
}

/// Text report: one line per group, then one block per gradient.
///
/// Gradients without stops of their own list the ones they inherit.
fn render(colors: &ElementColorMap, gradients: &GradientTable, members: bool) -> String {
    let mut out = String::new();

    for group in colors.iter() {
        let count = plural_count(group.elements().count(), "element");
        writeln!(out, "{} {:<16} {}", swatch(&group.key), group.key.to_string(), count).ok();
        if members {
            for member in &group.members {
                writeln!(out, "    {} {} = {}", member.element, member.site, member.original).ok();
            }
        }
    }

    if !gradients.is_empty() {
        writeln!(out).ok();
    }
    for gradient in gradients.iter() {
        let kind = match gradient.kind {
            svgtint::GradientKind::Linear => "linear",
            svgtint::GradientKind::Radial => "radial",
        };
        let stops = gradients.effective_stops(&gradient.id);
        write!(out, "url(#{}) {kind}", gradient.id).ok();
        if let Some(href) = &gradient.href {
            write!(out, " inherits #{href}").ok();
        }
        writeln!(out, ", {}", plural_count(stops.len(), "stop")).ok();
        for (index, stop) in stops.iter().enumerate() {
            writeln!(
                out,
                "    [{index}] {:.2} {} {} opacity {:.2}",
                stop.offset,
                swatch(&stop.color),
                stop.color,
                stop.opacity
            )
            .ok();
        }
    }

    out
}

/// A colored block for solid keys, a placeholder otherwise.
fn swatch(key: &ColorKey) -> String {
    match key {
        ColorKey::Solid(c) => "██"
            .if_supports_color(Stream::Stdout, |s| s.truecolor(c.r, c.g, c.b))
            .to_string(),
        ColorKey::Gradient(_) => "░░".to_string(),
        _ => "  ".to_string(),
    }
}

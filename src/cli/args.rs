//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use svgtint::{ColorKey, StopEdit, StopRef};

/// Inspect and recolor SVG icons
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the working directory
    #[arg(short = 'C', long, global = true, default_value = "svgtint.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List color groups and gradients
    #[command(visible_alias = "i")]
    Inspect {
        #[command(flatten)]
        args: InspectArgs,
    },

    /// Recolor groups and gradient stops
    #[command(visible_alias = "a")]
    Apply {
        #[command(flatten)]
        args: ApplyArgs,
    },

    /// Compute hover/isolation directives
    #[command(visible_alias = "p")]
    Preview {
        #[command(flatten)]
        args: PreviewArgs,
    },
}

/// Input shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// SVG file to read, `-` for stdin
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print JSON instead of a table
    #[arg(short, long)]
    pub json: bool,

    /// List every member of each group
    #[arg(short, long)]
    pub members: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Recolor a group, e.g. `--set '#ff0000=navy'` or `--set 'url(#a)=url(#b)'`
    #[arg(short, long = "set", value_name = "KEY=VALUE", value_parser = parse_recolor)]
    pub set: Vec<(ColorKey, String)>,

    /// Rewrite a gradient stop, e.g. `--stop sky:0=#fff,0.5` or `--stop sky:1=,0.2`
    #[arg(long = "stop", value_name = "ID:INDEX=COLOR[,OPACITY]", value_parser = parse_stop_edit)]
    pub stops: Vec<StopEdit>,

    /// Read edits from a TOML or JSON file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub edits: Option<PathBuf>,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Hover a color group
    #[arg(long, value_name = "KEY", conflicts_with = "isolate", required_unless_present = "isolate")]
    pub hover: Option<ColorKey>,

    /// Isolate a color group
    #[arg(long, value_name = "KEY")]
    pub isolate: Option<ColorKey>,

    /// Focus one stop of the active gradient group
    #[arg(long, value_name = "ID:INDEX", value_parser = parse_stop_ref)]
    pub stop: Option<StopRef>,

    /// Print JSON instead of a table
    #[arg(short, long)]
    pub json: bool,
}

impl Cli {
    pub fn input(&self) -> &InputArgs {
        match &self.command {
            Commands::Inspect { args } => &args.input,
            Commands::Apply { args } => &args.input,
            Commands::Preview { args } => &args.input,
        }
    }
}

// ============================================================================
// Value parsers
// ============================================================================

/// `KEY=VALUE`, where KEY is a group key or any color token.
fn parse_recolor(raw: &str) -> Result<(ColorKey, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.parse::<ColorKey>().map_err(|e| e.to_string())?;
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("missing replacement color in `{raw}`"));
    }
    Ok((key, value.to_string()))
}

/// `ID:INDEX`
fn parse_stop_ref(raw: &str) -> Result<StopRef, String> {
    let (gradient, index) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected ID:INDEX, got `{raw}`"))?;
    let gradient = gradient.trim().trim_start_matches('#');
    if gradient.is_empty() {
        return Err(format!("missing gradient id in `{raw}`"));
    }
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("`{index}` is not a stop index"))?;
    Ok(StopRef::new(gradient, index))
}

/// `ID:INDEX=COLOR[,OPACITY]`; COLOR may be empty to change only the opacity.
fn parse_stop_edit(raw: &str) -> Result<StopEdit, String> {
    let (target, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID:INDEX=COLOR[,OPACITY], got `{raw}`"))?;
    let stop = parse_stop_ref(target)?;
    let mut edit = StopEdit::new(stop.gradient, stop.index);

    // A trailing `,number` is the opacity; commas inside `rgb(...)` are not.
    let (color, opacity) = match value.rsplit_once(',') {
        Some((color, tail)) => match tail.trim().parse::<f32>() {
            Ok(opacity) if !color.contains('(') || color.contains(')') => (color, Some(opacity)),
            _ => (value, None),
        },
        None => (value, None),
    };

    let color = color.trim();
    if !color.is_empty() {
        edit = edit.with_color(color);
    }
    if let Some(opacity) = opacity {
        edit = edit.with_opacity(opacity);
    }
    if edit.color.is_none() && edit.opacity.is_none() {
        return Err(format!("nothing to change in `{raw}`"));
    }
    Ok(edit)
}

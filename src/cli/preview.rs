//! Preview command implementation.
//!
//! Drives the preview state machine with the events a UI would send for the
//! given flags and prints the resulting directive set.

use std::fmt::Write as _;

use anyhow::Result;
use serde_json::json;

use super::args::PreviewArgs;
use super::common::{load_session, to_json};
use svgtint::config::Config;
use svgtint::{Emphasis, PreviewDirective, PreviewEvent, PreviewState, log};

pub fn run(args: &PreviewArgs, config: &Config) -> Result<()> {
    let mut session = load_session(&args.input.file)?;
    let state = target_state(args);

    if let Some(key) = state.active_group()
        && !session.colors().contains(key)
    {
        log!("warn"; "no color group `{}` in this document", key);
    }

    let set = session.preview_set(&state, &config.preview);
    if args.json {
        let report = json!({ "state": state, "directives": set });
        println!("{}", to_json(&report, config.output.pretty)?);
    } else {
        print!("{}", render(&set.directives));
    }
    Ok(())
}

/// State reached from idle by hovering or clicking, then entering a stop.
fn target_state(args: &PreviewArgs) -> PreviewState {
    let mut state = PreviewState::Idle;
    if let Some(key) = &args.hover {
        state = state.on(&PreviewEvent::Enter(key.clone()));
    } else if let Some(key) = &args.isolate {
        state = state.on(&PreviewEvent::Click(key.clone()));
    }

    if let Some(stop) = &args.stop {
        let next = state.on(&PreviewEvent::EnterStop(stop.clone()));
        if next == state {
            log!("warn"; "ignoring --stop: `url(#{})` is not the active group", stop.gradient);
        }
        state = next;
    }
    state
}

fn render(directives: &[PreviewDirective]) -> String {
    let mut out = String::new();
    for d in directives {
        let emphasis = match d.emphasis {
            Emphasis::None => "",
            Emphasis::Pulse => "pulse",
            Emphasis::Isolated => "isolated",
        };
        writeln!(out, "{:.2} {:<8} {}", d.opacity, emphasis, d.element).ok();
    }
    out
}

//! Evaluation, read-only views and reset.

use ascent_core::ReportFormat;

use super::{open_engine, CmdResult};

pub fn evaluate() -> CmdResult {
    let mut engine = open_engine()?;
    for event in engine.daily_evaluation() {
        eprintln!("{}", event.message());
    }
    println!("{}", serde_json::to_string_pretty(&engine.dashboard())?);
    Ok(())
}

pub fn dashboard() -> CmdResult {
    let engine = open_engine()?;
    println!("{}", serde_json::to_string_pretty(&engine.dashboard())?);
    Ok(())
}

pub fn session(json: bool) -> CmdResult {
    let engine = open_engine()?;
    let session = engine.guided_session();
    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!("{} day (goal: {})", session.day_type.as_str(), session.long_term_goal);
    if session.directives.is_empty() {
        println!("  no tracked exercises yet");
    }
    for directive in &session.directives {
        println!("  {directive}");
    }
    if session.deload_suggested {
        println!("  deload suggested");
    }
    Ok(())
}

pub fn strict() -> CmdResult {
    let engine = open_engine()?;
    match engine.strict_mode_view() {
        Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
        None => println!("strict mode is off"),
    }
    Ok(())
}

pub fn report(format: &str) -> CmdResult {
    let format: ReportFormat = format.parse()?;
    let engine = open_engine()?;
    print!("{}", engine.export_weekly_report(format)?);
    if format == ReportFormat::Json {
        println!();
    }
    Ok(())
}

pub fn log(limit: usize) -> CmdResult {
    let engine = open_engine()?;
    let logs = engine.logs();
    let start = logs.len().saturating_sub(limit);
    for entry in &logs[start..] {
        println!(
            "{} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.message()
        );
    }
    Ok(())
}

pub fn reset() -> CmdResult {
    let mut engine = open_engine()?;
    engine.reset();
    println!("state reset");
    Ok(())
}

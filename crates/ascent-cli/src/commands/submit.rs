use std::path::PathBuf;

use ascent_core::Domain;
use clap::Args;

use super::{open_engine, CmdResult};

/// Exit code for a rejected (but well-formed) submission.
const REJECTED_EXIT_CODE: i32 = 2;

#[derive(Args)]
pub struct SubmitArgs {
    /// Domain: training, diet, finance, academics, spiritual, mental, content
    pub domain: String,
    /// Payload as inline JSON
    #[arg(long, conflicts_with = "file")]
    pub payload: Option<String>,
    /// Read the payload JSON from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn run(args: SubmitArgs) -> CmdResult {
    let domain: Domain = args.domain.parse()?;
    let raw = match (args.payload, args.file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?,
        (None, None) => return Err("either --payload or --file is required".into()),
    };
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    let mut engine = open_engine()?;
    let outcome = engine.submit_json(domain, &value);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.accepted {
        std::process::exit(REJECTED_EXIT_CODE);
    }
    Ok(())
}

use ascent_core::MentorContext;
use clap::Args;

use super::{open_engine, CmdResult};

#[derive(Args)]
pub struct MentorArgs {
    /// A relapse or binge happened today
    #[arg(long)]
    pub relapse: bool,
    /// Today's training is still to do
    #[arg(long)]
    pub training_pending: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: MentorArgs) -> CmdResult {
    let engine = open_engine()?;
    let directive = engine.mentor_directive(&MentorContext {
        relapse: args.relapse,
        training_pending: args.training_pending,
    });
    if args.json {
        println!("{}", serde_json::to_string_pretty(&directive)?);
    } else {
        println!("{}", directive.message);
    }
    Ok(())
}

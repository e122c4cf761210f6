use ascent_core::Macros;
use clap::Args;

use super::{open_engine, CmdResult};

#[derive(Args)]
pub struct DietGuideArgs {
    /// Calories consumed so far
    #[arg(long, default_value_t = 0.0)]
    pub calories: f64,
    /// Protein consumed so far (g)
    #[arg(long, default_value_t = 0.0)]
    pub protein: f64,
    /// Carbs consumed so far (g)
    #[arg(long, default_value_t = 0.0)]
    pub carbs: f64,
    /// Fat consumed so far (g)
    #[arg(long, default_value_t = 0.0)]
    pub fat: f64,
}

pub fn run(args: DietGuideArgs) -> CmdResult {
    let engine = open_engine()?;
    let guide = engine.diet_guide(&Macros {
        calories: args.calories,
        protein: args.protein,
        carbs: args.carbs,
        fat: args.fat,
    });
    println!("{}", serde_json::to_string_pretty(&guide)?);
    Ok(())
}

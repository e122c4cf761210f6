pub mod config;
pub mod diet;
pub mod mentor;
pub mod submit;
pub mod view;

use ascent_core::{Config, Database, Engine};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Engine over the on-disk database and config in the data directory.
pub fn open_engine() -> Result<Engine<Database>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let engine = Engine::load(config, db)?;
    tracing::debug!(day = engine.snapshot().core.current_day, "engine ready");
    Ok(engine)
}

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "ascent", version, about = "Ascent progress tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an execution for one domain
    Submit(commands::submit::SubmitArgs),
    /// Run the daily evaluation
    Evaluate,
    /// Show the dashboard snapshot
    Dashboard,
    /// Show today's guided training session
    Session {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what is left of today's diet targets
    DietGuide(commands::diet::DietGuideArgs),
    /// Show the mentor's directive
    Mentor(commands::mentor::MentorArgs),
    /// Show the strict-mode plan, if strict mode is on
    Strict,
    /// Export the weekly report
    Report {
        /// Output format: json or text
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show recent log entries
    Log {
        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Discard all progress
    Reset,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("ASCENT_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Submit(args) => commands::submit::run(args),
        Commands::Evaluate => commands::view::evaluate(),
        Commands::Dashboard => commands::view::dashboard(),
        Commands::Session { json } => commands::view::session(json),
        Commands::DietGuide(args) => commands::diet::run(args),
        Commands::Mentor(args) => commands::mentor::run(args),
        Commands::Strict => commands::view::strict(),
        Commands::Report { format } => commands::view::report(&format),
        Commands::Log { limit } => commands::view::log(limit),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reset => commands::view::reset(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

use clap::Parser;

/// walkie: run a push-to-talk round on an in-process mesh.
#[derive(Parser, Debug)]
#[command(name = "walkie", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Number of simulated participants.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=8))]
    pub peers: u8,

    /// Display name of the first participant.
    #[arg(long)]
    pub name: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write the effective config back to the config file.
    #[arg(long)]
    pub save_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

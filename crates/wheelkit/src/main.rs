use clap::{Parser, Subcommand};
use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use wheelkit::control::Command;
use wheelkit::roll::LocalRollService;
use wheelkit::{PresetId, SOCKET_PATH, View};

#[derive(Parser, Debug)]
#[command(name = "wheelctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Show the wheel window
    Show,
    /// Hide the wheel window
    Hide,
    /// Roll a preset and spin the wheel to the winner
    Roll {
        /// Preset id (defaults to the configured preset)
        preset: Option<String>,
    },
    /// Spin to the outcome of a past roll again
    Replay {
        /// History entry id
        id: u64,
    },
    /// Stop a spin in progress
    Cancel,
    /// Change spin settings
    Set {
        /// Spin duration in seconds
        #[arg(short = 'd', long)]
        duration: Option<f64>,

        /// Extra turns multiplier
        #[arg(short = 's', long)]
        speed: Option<f64>,
    },
    /// Switch the window to another view (wheel, history, settings)
    View { view: View },
    /// List the presets of a catalog file
    Presets {
        #[arg(short = 'c', long)]
        catalog: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Show => send_command(&Command::Show),
        Commands::Hide => send_command(&Command::Hide),
        Commands::Cancel => send_command(&Command::Cancel),
        Commands::Roll { preset } => send_command(&Command::Roll(preset.map(PresetId::new))),
        Commands::Replay { id } => send_command(&Command::Replay(id)),
        Commands::View { view } => send_command(&Command::View(view)),
        Commands::Set { duration, speed } => {
            if duration.is_none() && speed.is_none() {
                anyhow::bail!("Nothing to set, pass --duration and/or --speed");
            }
            if let Some(secs) = duration {
                send_command(&Command::SetDuration(secs))?;
            }
            if let Some(mult) = speed {
                send_command(&Command::SetSpeed(mult))?;
            }
            Ok(())
        }
        Commands::Presets { catalog } => list_presets(catalog),
    }
}

fn list_presets(catalog: PathBuf) -> anyhow::Result<()> {
    let service = LocalRollService::open(&catalog, None)?;
    for preset in service.presets() {
        println!("{}\t{}", preset.id, preset.name);
    }
    Ok(())
}

fn send_command(cmd: &Command) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to next-wheel at {}: {}. Is next-wheel running?",
            SOCKET_PATH,
            e
        )
    })?;

    writeln!(stream, "{}", cmd)?;
    Ok(())
}

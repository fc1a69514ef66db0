use clap::{error::ErrorKind, Parser};
use std::{path::PathBuf, process};
use tracing_subscriber::EnvFilter;
use vocal_midi::{
    load_config, paths, set_stage_progress_callback, set_tool_output_callback, Pipeline,
    RunArtifacts, SongLayout, Stage,
};

#[derive(Parser)]
#[command(name = "vocal-midi")]
#[command(about = "Transcribe the vocal melody of a song to MIDI", long_about = None)]
#[command(version)]
struct Cli {
    /// Song audio file, relative to the working root
    audio_file: PathBuf,

    /// JSON file with the note-detection thresholds
    config_file: PathBuf,

    /// Working root for separated stems and output
    #[arg(long, env = "VOCAL_MIDI_ROOT", default_value = paths::DEFAULT_ROOT)]
    root: PathBuf,

    /// Only print the path of the finished MIDI file
    #[arg(short, long)]
    quiet: bool,

    /// Log pipeline details
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(artifacts) => {
            if cli.quiet {
                println!("{}", artifacts.midi_path.display());
            } else {
                eprintln!("🎼 Detected key: {}", artifacts.key);
                eprintln!(
                    "✅ MIDI file processed and saved as {}",
                    artifacts.midi_path.display()
                );
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<RunArtifacts> {
    // Thresholds first: a bad config must fail before any model runs.
    let config = load_config(&cli.config_file)?;
    let layout = SongLayout::new(&cli.root, &cli.audio_file)?;

    if !cli.quiet {
        eprintln!("🎵 Vocal melody transcription");
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        eprintln!("Input:  {}", layout.input.display());
        eprintln!("Output: {}", layout.output_dir().display());
        eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        set_stage_progress_callback(|stage| {
            if stage != Stage::Finished {
                eprintln!("🔄 {}...", stage.label());
            }
        });
        set_tool_output_callback(|_tool, line| eprintln!("   {line}"));
    }

    Ok(Pipeline::external().run(&layout, &config)?)
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info,vocal_midi=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

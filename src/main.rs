//! Matrix Reel player - Play frames on a terminal preview of the panel.

use std::fs;
use std::io;
use std::path::PathBuf;

use matrix_reel::{
    playback::{AnsiSink, CancelToken, PlaybackScheduler, SystemClock, open_feed},
    schema::{AppConfig, SourceConfig, VideoConfig},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Play an animation on a 64x32 panel preview in the terminal.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to player configuration file");
        eprintln!();
        eprintln!("Example configurations are printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: AppConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let cancel = CancelToken::new();
    if let Err(e) = cancel.cancel_on_interrupt() {
        eprintln!("Warning: Ctrl-C will not stop playback cleanly: {}", e);
    }

    let mut feed = open_feed(&config, &cancel).unwrap_or_else(|e| {
        eprintln!("Error opening source: {}", e);
        std::process::exit(1);
    });

    // Clear the screen once; every frame then redraws from the top-left.
    print!("\x1b[2J");

    let sink = AnsiSink::new(io::stdout().lock(), &config.display).unwrap_or_else(|e| {
        eprintln!("Error opening display: {}", e);
        std::process::exit(1);
    });

    let mut scheduler = PlaybackScheduler::new(sink, SystemClock::new(cancel.clone()), cancel)
        .with_max_frames(config.playback.max_frames);

    match scheduler.run(&mut *feed) {
        Ok(stats) => {
            eprintln!(
                "Played {} frames ({} overruns, {:.2}ms mean push)",
                stats.frames,
                stats.overruns,
                stats.mean_render_time().as_secs_f64() * 1000.0
            );
        }
        Err(e) => {
            eprintln!("Playback failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_example_config() {
    let examples = [
        ("procedural.json", SourceConfig::Procedural { seed: None }),
        (
            "stream.json",
            SourceConfig::RemoteStream {
                url: matrix_reel::schema::DEFAULT_STREAM_URL.to_string(),
            },
        ),
        ("video.json", SourceConfig::RemoteVideo(VideoConfig::default())),
        (
            "compiled.json",
            SourceConfig::CompiledAsset {
                path: "clip.mxr".into(),
            },
        ),
    ];

    for (name, source) in examples {
        let config = AppConfig {
            source,
            ..Default::default()
        };
        println!("Example configuration ({}):", name);
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing example: {}", e),
        }
        println!();
    }
}

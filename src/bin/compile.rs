//! Matrix Reel compiler - Bake an animated image into a compiled asset.

use std::time::Instant;

use matrix_reel::animation::{CompileArgs, RecorderConfig, UsageError, compile_file};

fn print_usage(program: &str) {
    println!("Usage: {} <input> <output> [frame-limit]", program);
    println!();
    println!("Decode an animated image once and store its quantized frames.");
    println!();
    println!("Arguments:");
    println!("  input        Animated image (GIF, APNG, WebP) or still image");
    println!("  output       Destination (.mxr binary, or .json)");
    println!("  frame-limit  Only keep the first N frames");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("matrix-reel-compile");

    let args = match CompileArgs::parse(args.get(1..).unwrap_or_default()) {
        Ok(args) => args,
        Err(UsageError::ArgumentCount(_)) => {
            print_usage(program);
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(program);
            std::process::exit(2);
        }
    };

    println!(
        "Converting {} to {}...",
        args.input.display(),
        args.output.display()
    );
    if let Some(limit) = args.frame_limit {
        println!("Using first {} frames only", limit);
    }

    let config = RecorderConfig {
        #[cfg(feature = "lz4")]
        compression: matrix_reel::animation::CompressionType::Lz4,
        ..Default::default()
    };

    let start = Instant::now();
    match compile_file(&args, &config) {
        Ok(stats) => {
            println!("Done! Output written to {}", args.output.display());
            println!("  {}", stats);
            println!("  Time: {:.2}s", start.elapsed().as_secs_f32());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

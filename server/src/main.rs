use clap::Parser;
use pond_server::init::{self, HostConfig};
use pond_server::scene::{load_scene, save_scene};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Scene file in ron format; the built-in pond is used when omitted
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(short, long)]
    ticks: Option<u64>,

    #[arg(long, default_value_t = 60)]
    tps: u32,

    /// Seed for drip jitter; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Write the resolved scene to this path and exit
    #[arg(long)]
    write_scene: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if args.tps < 1 || args.tps > 240 {
        eprintln!("Error: tps must be between 1 and 240 (inclusive).");
        eprintln!("Got: {}", args.tps);
        std::process::exit(1);
    }

    let scene = match load_scene(args.scene.as_deref()) {
        Ok(scene) => scene,
        Err(err) => {
            eprintln!("Error: could not load scene: {err}");
            std::process::exit(1);
        }
    };

    if let Some(path) = args.write_scene {
        if let Err(err) = save_scene(&scene, &path) {
            eprintln!("Error: could not write scene to {}: {err}", path.display());
            std::process::exit(1);
        }
        return;
    }

    init::init(
        scene,
        HostConfig {
            ticks_per_second: args.tps,
            max_ticks: args.ticks,
            seed: args.seed.unwrap_or_else(rand::random::<u64>),
        },
    );
}

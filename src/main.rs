//! planetgen CLI - procedural planet texture generator.
//!
//! Generates height, specular, diffuse and normal maps for a seeded planet
//! and writes each buffer as a PNG.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use rand::distributions::{Alphanumeric, DistString};

use planetgen::export::{export_texture_set_png, PngExportOptions};
use planetgen::gradient::generate_gradient;
use planetgen::noise::{derive_octaves, hash_seed, NoiseSettings, ShapeParameters};
use planetgen::pipeline::{PipelineConfig, PipelineError, PipelineEvent, ProgressivePipeline, Regenerate};
use planetgen::texture::TextureSet;

/// Pause between non-blocking pipeline polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Procedural planet texture generator.
#[derive(Parser)]
#[command(name = "planetgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Shape flags shared by every subcommand.
#[derive(clap::Args, Clone)]
struct ShapeArgs {
    /// Seed string; a random one is drawn when omitted.
    #[arg(short, long)]
    seed: Option<String>,

    /// Roughness tier (0-1: one octave, 2: two, 3+: three).
    #[arg(long, default_value = "2")]
    roughness: u32,

    /// Sea level percentage (0-100).
    #[arg(long, default_value = "25")]
    sea_level: f32,

    /// Land mass size percentage (0-100).
    #[arg(long, default_value = "80")]
    land_mass: f32,

    /// JSON octave list overriding the derived noise settings.
    #[arg(long)]
    noise_settings: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate texture buffers and export them as PNG.
    Generate {
        #[command(flatten)]
        shape: ShapeArgs,

        /// Resolution of the first tier before quality scaling.
        #[arg(long, default_value = "256")]
        base_resolution: u32,

        /// Number of tiers; each doubles the previous resolution.
        #[arg(long, default_value = "3")]
        tiers: u32,

        /// Quality multiplier applied to every tier.
        #[arg(short, long, default_value = "1")]
        quality: u32,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "planet")]
        name: String,

        /// Also export every intermediate tier.
        #[arg(long)]
        every_tier: bool,

        /// Give up after this many seconds.
        #[arg(long, default_value = "600")]
        timeout_secs: u64,
    },

    /// Generate many random planets and export each one.
    Batch {
        /// Number of planets to generate.
        #[arg(short, long, default_value = "10")]
        count: u32,

        /// Resolution of the first tier before quality scaling.
        #[arg(long, default_value = "256")]
        base_resolution: u32,

        /// Number of tiers; each doubles the previous resolution.
        #[arg(long, default_value = "3")]
        tiers: u32,

        /// Quality multiplier applied to every tier.
        #[arg(short, long, default_value = "1")]
        quality: u32,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Give up on a planet after this many seconds.
        #[arg(long, default_value = "600")]
        timeout_secs: u64,
    },

    /// Print the derived octaves and gradient for a seed without generating.
    Info {
        #[command(flatten)]
        shape: ShapeArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            shape,
            base_resolution,
            tiers,
            quality,
            output,
            name,
            every_tier,
            timeout_secs,
        } => {
            let config = PipelineConfig {
                base_resolution,
                tier_count: tiers,
                quality_tier: quality,
                ..Default::default()
            };
            run_generate(shape, config, output, name, every_tier, Duration::from_secs(timeout_secs));
        }
        Commands::Batch {
            count,
            base_resolution,
            tiers,
            quality,
            output,
            timeout_secs,
        } => {
            let config = PipelineConfig {
                base_resolution,
                tier_count: tiers,
                quality_tier: quality,
                ..Default::default()
            };
            run_batch(count, config, output, Duration::from_secs(timeout_secs));
        }
        Commands::Info { shape } => {
            run_info(shape);
        }
    }
}

fn random_seed() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), 16)
}

fn resolve_seed(seed: Option<String>) -> String {
    seed.unwrap_or_else(random_seed)
}

fn parse_shape(args: &ShapeArgs) -> ShapeParameters {
    ShapeParameters::new(args.roughness, args.sea_level, args.land_mass).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

fn parse_override(args: &ShapeArgs) -> Option<NoiseSettings> {
    args.noise_settings.as_deref().map(|json| {
        NoiseSettings::from_json(json).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        })
    })
}

fn run_generate(
    args: ShapeArgs,
    config: PipelineConfig,
    output: PathBuf,
    name: String,
    every_tier: bool,
    timeout: Duration,
) {
    let shape = parse_shape(&args);
    let noise_override = parse_override(&args);
    let seed = resolve_seed(args.seed);

    println!("planetgen - Procedural Planet Textures");
    println!("======================================");
    println!("Seed: {} (hash {})", seed, hash_seed(&seed));
    println!(
        "Shape: roughness {}, sea level {}%, land mass {}%",
        shape.roughness_tier, shape.sea_level_percent, shape.land_mass_size
    );
    println!("Tiers: {:?}", config.resolutions());
    println!("Output: {}", output.display());

    let start = Instant::now();
    let mut pipeline = ProgressivePipeline::new(&seed, shape, config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match noise_override {
        Some(settings) => {
            println!("Noise override: {} octave(s)", settings.len());
            if let Err(e) = pipeline.regenerate(Regenerate::Noise(settings), Instant::now()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => pipeline.start(Instant::now()),
    }

    let options = PngExportOptions::default();
    let settled = drive(&mut pipeline, timeout, |tier, set| {
        println!("  Tier {} ready: {}x{}", tier, set.resolution, set.resolution);
        if every_tier {
            export_tier(set, &output, &name, &options);
        }
    });
    if let Err(e) = settled {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!("Settled in {:.2?}", start.elapsed());

    let Some(set) = pipeline.current() else {
        eprintln!("Error: generation finished without publishing buffers");
        std::process::exit(1);
    };

    let export_start = Instant::now();
    let written = export_texture_set_png(&set, &output, &name, &options).unwrap_or_else(|e| {
        eprintln!("Error exporting textures: {}", e);
        std::process::exit(1);
    });
    for path in &written {
        println!("  Wrote {}", path.display());
    }

    println!("Export completed in {:.2?}", export_start.elapsed());
    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

/// Polls the pipeline until it settles, handing every finished tier to `on_tier`.
fn drive(
    pipeline: &mut ProgressivePipeline,
    timeout: Duration,
    mut on_tier: impl FnMut(usize, &TextureSet),
) -> Result<(), PipelineError> {
    let deadline = Instant::now() + timeout;
    loop {
        for event in pipeline.poll(Instant::now()) {
            match event {
                PipelineEvent::TierReady { tier, set, .. } => on_tier(tier, &set),
                PipelineEvent::Settled { .. } => return Ok(()),
                PipelineEvent::GenerationFailed { resolution, error, .. } => {
                    return Err(PipelineError::GenerationFailed {
                        resolution,
                        attempts: pipeline.config().max_retries + 1,
                        source: error,
                    });
                }
            }
        }
        if Instant::now() >= deadline {
            return Err(PipelineError::Timeout(timeout));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn export_tier(set: &TextureSet, output: &Path, name: &str, options: &PngExportOptions) {
    let tier_name = format!("{}_{}", name, set.resolution);
    if let Err(e) = export_texture_set_png(set, output, &tier_name, options) {
        eprintln!("Error exporting tier {}: {}", set.resolution, e);
        std::process::exit(1);
    }
}

fn run_batch(count: u32, config: PipelineConfig, output: PathBuf, timeout: Duration) {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    println!("planetgen - Batch Generation");
    println!("============================");
    println!("Planets: {}", count);
    println!("Tiers: {:?}", config.resolutions());
    println!("Output: {}", output.display());

    let options = PngExportOptions::default();
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    let mut failed = 0;

    for i in 0..count {
        let seed = random_seed();
        let shape = ShapeParameters::random(&mut rng);
        println!(
            "\n[{}/{}] {} (roughness {}, sea level {}%, land mass {}%)",
            i + 1,
            count,
            seed,
            shape.roughness_tier,
            shape.sea_level_percent,
            shape.land_mass_size
        );

        let planet_start = Instant::now();
        let result = ProgressivePipeline::new(&seed, shape, config.clone()).and_then(|mut pipeline| {
            pipeline.start(Instant::now());
            drive(&mut pipeline, timeout, |_, _| {})?;
            Ok(pipeline.current())
        });

        match result {
            Ok(Some(set)) => match export_texture_set_png(&set, &output, &seed, &options) {
                Ok(written) => println!("  Wrote {} file(s) in {:.2?}", written.len(), planet_start.elapsed()),
                Err(e) => {
                    eprintln!("  Error exporting {}: {}", seed, e);
                    failed += 1;
                }
            },
            Ok(None) => {
                eprintln!("  Error: {} settled without publishing buffers", seed);
                failed += 1;
            }
            Err(e) => {
                eprintln!("  Error generating {}: {}", seed, e);
                failed += 1;
            }
        }
    }

    println!("\nTotal time: {:.2?}", start.elapsed());
    if failed > 0 {
        eprintln!("{} of {} planet(s) failed", failed, count);
        std::process::exit(1);
    }
    println!("Done!");
}

fn run_info(args: ShapeArgs) {
    let shape = parse_shape(&args);
    let settings = parse_override(&args).unwrap_or_else(|| derive_octaves(&shape));
    let seed = resolve_seed(args.seed);
    let seed_hash = hash_seed(&seed);
    let gradient = generate_gradient(seed_hash);

    println!("planetgen - Planet Configuration Info");
    println!("=====================================");
    println!();
    println!("Seed:      {}", seed);
    println!("Seed hash: {}", seed_hash);
    println!();
    println!("Octaves ({}):", settings.len());
    for (i, octave) in settings.octaves.iter().enumerate() {
        println!(
            "  [{}] shift {:>5.1}  passes {:>2}  strength {:.2}  roughness {:.2}  resistance {:.2}  min {:.2}  {}",
            i,
            octave.shift_degrees,
            octave.passes,
            octave.strength,
            octave.roughness,
            octave.resistance,
            octave.min_threshold,
            if octave.hard_clamp { "hard" } else { "soft" }
        );
    }
    match settings.to_json() {
        Ok(json) => println!("  JSON: {}", json),
        Err(e) => eprintln!("Error: {}", e),
    }
    println!();
    println!("Palette: {}", gradient.palette_index());
    for stop in gradient.stops() {
        println!(
            "  {:>3}: rgb({}, {}, {})",
            stop.position, stop.color[0], stop.color[1], stop.color[2]
        );
    }
}

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kwd_loader::{ArchiveLoader, LoaderConfig};

#[derive(Parser)]
#[command(name = "kwd-dump")]
#[command(about = "Load a KWD level and print a summary or a JSON dump")]
struct Args {
    /// Game directory the level's path table is relative to
    base_dir: PathBuf,

    /// Level file, relative to the base directory
    level_file: PathBuf,

    /// JSON loader config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the whole archive as JSON
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => LoaderConfig::from_json_file(path)?,
        None => LoaderConfig::default(),
    };
    let loader = ArchiveLoader::open(&args.base_dir, &args.level_file, config)?;
    let archive = loader.load()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(archive)?);
        return Ok(());
    }

    let level = archive.level();
    println!("Level:        {}", level.name);
    println!("Map:          {}x{}", archive.map().width(), archive.map().height());
    println!("Files read:   {}", loader.files_read());
    println!();
    println!("Catalogs:");
    let catalogs = [
        ("terrain", archive.terrain().len()),
        ("rooms", archive.rooms().len()),
        ("traps", archive.traps().len()),
        ("doors", archive.doors().len()),
        ("keeper spells", archive.keeper_spells().len()),
        ("creature spells", archive.creature_spells().len()),
        ("creatures", archive.creatures().len()),
        ("players", archive.players().len()),
        ("objects", archive.objects().len()),
        ("effects", archive.effects().len()),
        ("effect elements", archive.effect_elements().len()),
        ("shots", archive.shots().len()),
    ];
    for (name, count) in catalogs {
        println!("  {:<16} {}", name, count);
    }
    println!();
    println!("Things:");
    for (name, count) in archive.things().counts() {
        if count > 0 {
            println!("  {:<16} {}", name, count);
        }
    }
    println!();
    println!("Triggers:     {}", archive.triggers().len());
    if let Some(imp) = archive.imp() {
        println!("Worker:       {}", imp.name);
    }
    if let Some(heart) = archive.dungeon_heart() {
        println!("Heart:        {}", heart.name);
    }

    Ok(())
}

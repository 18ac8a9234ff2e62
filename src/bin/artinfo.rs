use art_particles::{Field, FieldKind, Snapshot, SnapshotFiles};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "artinfo")]
#[command(about = "Inspect ART particle snapshot headers and layout")]
struct Cli {
    /// Path to the PMcrd header file
    #[arg(long)]
    header: PathBuf,

    /// Path to the PMcrs0 particle data file
    #[arg(long)]
    data: PathBuf,

    /// Star count (prefix of the last species interval)
    #[arg(long, default_value = "0")]
    nstars: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header fields, derived units, and species intervals
    Info,
    /// Print the byte ranges a (species, field) read would touch
    Ranges {
        /// Species index, 0-based
        species: usize,
        /// Field name (x, y, z, vx, vy, vz)
        field: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let files = SnapshotFiles::new(&cli.header, &cli.data);
    let snapshot = Snapshot::open(&files, cli.nstars)?;

    match cli.command {
        Commands::Info => {
            println!("{}", snapshot.header());
            let geom = snapshot.geometry();
            println!(
                "Data file: {} pages of {} particles ({} slots)",
                geom.pages(),
                geom.particles_per_page(),
                geom.capacity()
            );

            let scales = snapshot.scale_factors();
            println!("scaleV: {:.6e} km/s per unit", scales.scale_v);
            println!("scaleC: {:.6e} kpc per unit", scales.scale_c);
            println!("scaleM: {:.6e} Msun per unit", scales.scale_m);
            for (i, mass) in scales.mass_per_species.iter().enumerate() {
                let (lo, hi) = snapshot.species_interval(i)?;
                println!(
                    "specie{}: [{}, {}) mass {:.6e} Msun",
                    i, lo, hi, mass
                );
            }
            if cli.nstars > 0 {
                println!("stars: first {} particles of the last species", cli.nstars);
            }
        }
        Commands::Ranges { species, field } => {
            let field = Field::from_name(&field)?;
            let plane = match field.kind() {
                FieldKind::Stored(plane) => plane,
                _ => anyhow::bail!("field {} is derived, not stored on disk", field),
            };
            let (lo, hi) = snapshot.species_interval(species)?;
            let ranges = snapshot.geometry().plane_ranges(lo, hi - lo, plane)?;
            println!(
                "specie{} {} -> {} range(s) covering {} particles",
                species,
                plane,
                ranges.len(),
                hi - lo
            );
            for range in ranges {
                println!("  offset {:>12}  count {:>8}", range.offset, range.count);
            }
        }
    }

    Ok(())
}

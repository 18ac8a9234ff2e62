//! Reader for ART N-body particle snapshots.
//!
//! Decodes the big-endian PMcrd/PMcrs file pair written by the ART
//! cosmological simulation code: a fixed-schedule particle header and a
//! page-interleaved particle data file holding positions and velocities for
//! a variable number of particle species (dark-matter mass classes plus a
//! star population stored as a prefix of the last species).
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`header`] | [`ParticleHeader`] fixed-schedule decode/encode, parameter reconciliation |
//! | [`units`] | [`ScaleFactors`] physical unit derivation |
//! | [`layout`] | [`PageGeometry`] page arithmetic, [`Plane`], byte-range resolution |
//! | [`reader`] | [`ParticleReader`] seek-and-read plane extraction |
//! | [`species`] | [`SpeciesTable`] index intervals, [`Field`] classification |
//! | [`snapshot`] | [`Snapshot`] session facade: open, load, cache |
//! | [`writer`] | [`SnapshotWriter`] page-interleaved encoder |
//!
//! # Quick Start
//!
//! ```ignore
//! use art_particles::{Field, Snapshot, SnapshotFiles};
//!
//! let files = SnapshotFiles::new("PMcrd.DAT", "PMcrs0.DAT");
//! let mut snapshot = Snapshot::open(&files, 50_000)?;
//!
//! let scales = snapshot.scale_factors().clone();
//! let arrays = snapshot.load_species(0, &[Field::PositionX, Field::VelocityX])?;
//! let x_kpc: Vec<f64> = arrays[&Field::PositionX]
//!     .iter()
//!     .map(|&x| x * scales.scale_c)
//!     .collect();
//! ```
//!
//! # Binary Format
//!
//! The header file is a 533-byte fixed schedule (4-byte record marker,
//! 45-byte label, then big-endian f32/i32 scalars and short arrays ending
//! with the box size). The data file is a sequence of pages of `Nrow^2`
//! particles; each page stores six interleaved planes (x, y, z, vx, vy, vz),
//! each plane a contiguous run of big-endian f32. The file size must be an
//! exact multiple of the page size; species intervals may start or end
//! mid-page.
//!
//! # Features
//!
//! - **`cli`** — enables the `artinfo` binary for inspecting snapshot
//!   headers and derived units from the command line.

pub mod error;
pub mod header;
pub mod layout;
pub mod reader;
pub mod snapshot;
pub mod species;
pub mod units;
pub mod writer;

pub use error::{ArtError, Result};
pub use header::{ParameterMismatch, ParticleHeader, HEADER_SIZE, MAX_SPECIES};
pub use layout::{ByteRange, PageGeometry, Plane};
pub use reader::ParticleReader;
pub use snapshot::{Snapshot, SnapshotFiles};
pub use species::{Field, FieldKind, SpeciesTable};
pub use units::ScaleFactors;
pub use writer::{write_header, SnapshotWriter};

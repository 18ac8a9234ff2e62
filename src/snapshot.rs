use crate::error::{ArtError, Result};
use crate::header::{ParameterMismatch, ParticleHeader};
use crate::layout::PageGeometry;
use crate::reader::ParticleReader;
use crate::species::{Field, FieldKind, SpeciesTable};
use crate::units::ScaleFactors;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Product of the fixed domain-dimension extents `[2, 2, 2]`; constant
/// per-species masses are normalized by this.
const DOMAIN_DIMENSION_PRODUCT: f64 = 8.0;

/// Resolved snapshot file paths, one optional slot per file role.
///
/// Populated by whatever discovers files (glob matching on the
/// `PMcrd*/PMcrs0*/stars*` naming convention lives outside this crate) and
/// validated before the decoder touches anything.
#[derive(Debug, Clone, Default)]
pub struct SnapshotFiles {
    /// PMcrd particle header file.
    pub header: Option<PathBuf>,
    /// PMcrs0 particle data file.
    pub data: Option<PathBuf>,
    /// Optional stars auxiliary file; not read here, carried for callers.
    pub stars: Option<PathBuf>,
}

impl SnapshotFiles {
    pub fn new(header: impl Into<PathBuf>, data: impl Into<PathBuf>) -> Self {
        Self {
            header: Some(header.into()),
            data: Some(data.into()),
            stars: None,
        }
    }

    /// Check that the required roles are present.
    ///
    /// # Errors
    /// Returns a config error naming the first missing role.
    pub fn validate(&self) -> Result<(&Path, &Path)> {
        let header = self
            .header
            .as_deref()
            .ok_or(ArtError::MissingFile { role: "header" })?;
        let data = self
            .data
            .as_deref()
            .ok_or(ArtError::MissingFile { role: "data" })?;
        Ok((header, data))
    }
}

/// One open snapshot: decoded header, derived tables, and a per-(species,
/// field) result cache.
///
/// The header, species table, geometry, and scale factors are computed once
/// at open and immutable afterward. The backing files are treated as
/// immutable for the process lifetime, so cached arrays are never
/// invalidated.
pub struct Snapshot {
    data_path: PathBuf,
    header: ParticleHeader,
    species: SpeciesTable,
    geometry: PageGeometry,
    scales: ScaleFactors,
    nstars: u64,
    star_masses: Option<Vec<f64>>,
    cache: HashMap<(usize, Field), Arc<[f64]>>,
}

impl Snapshot {
    /// Open a snapshot: decode the header, derive species intervals, page
    /// geometry, and scale factors, and validate them against each other.
    ///
    /// `nstars` is the externally supplied star count; the first `nstars`
    /// particles of the last species interval are the star sub-population.
    ///
    /// # Errors
    /// Any header, geometry, or species validation failure aborts the open;
    /// no partially initialized snapshot is returned.
    pub fn open(files: &SnapshotFiles, nstars: u64) -> Result<Self> {
        let (header_path, data_path) = files.validate()?;

        let header = ParticleHeader::from_reader(File::open(header_path)?)?;
        let species = SpeciesTable::from_header(&header)?;

        let nrow = u32::try_from(header.nrow).unwrap_or(0);
        let file_size = std::fs::metadata(data_path)?.len();
        let geometry = PageGeometry::new(nrow, file_size)?;

        let total = species.total_particles();
        if total > geometry.capacity() {
            return Err(ArtError::RangeOutOfBounds {
                start: 0,
                end: total,
                capacity: geometry.capacity(),
            });
        }

        let last = species.len(species.last_species())?;
        if nstars > last {
            return Err(ArtError::StarCountExceedsSpecies {
                nstars,
                available: last,
            });
        }

        let scales = ScaleFactors::derive(&header, nstars);

        Ok(Self {
            data_path: data_path.to_path_buf(),
            header,
            species,
            geometry,
            scales,
            nstars,
            star_masses: None,
            cache: HashMap::new(),
        })
    }

    pub fn header(&self) -> &ParticleHeader {
        &self.header
    }

    pub fn scale_factors(&self) -> &ScaleFactors {
        &self.scales
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn species_count(&self) -> usize {
        self.species.species_count()
    }

    pub fn species_interval(&self, species: usize) -> Result<(u64, u64)> {
        self.species.interval(species)
    }

    pub fn nstars(&self) -> u64 {
        self.nstars
    }

    /// Compare header scalars against externally seeded parameter values.
    /// The header always wins; this only reports the disagreements.
    pub fn reconcile_parameters(&self, seeded: &HashMap<String, f64>) -> Vec<ParameterMismatch> {
        self.header.reconcile(seeded)
    }

    /// Supply per-particle masses for the star prefix of the last species.
    ///
    /// Values are passed through verbatim when the mass field is loaded;
    /// they are external data this format cannot derive.
    ///
    /// # Errors
    /// Fails if the array length differs from `nstars`.
    pub fn set_star_masses(&mut self, masses: Vec<f64>) -> Result<()> {
        if masses.len() as u64 != self.nstars {
            return Err(ArtError::StarMassCountMismatch {
                expected: self.nstars,
                actual: masses.len(),
            });
        }
        // Any cached mass array for the last species predates this data.
        self.cache
            .remove(&(self.species.last_species(), Field::Mass));
        self.star_masses = Some(masses);
        Ok(())
    }

    /// Load the requested fields for one species, one array per field.
    ///
    /// Stored planes are read in parallel, one file handle per worker;
    /// derived fields are synthesized from the header tables. Results are
    /// memoized per (species, field) for the life of the snapshot, so
    /// repeated loads share the same arrays. The load is atomic: on error
    /// nothing is cached and no partial map is returned.
    pub fn load_species(
        &mut self,
        species: usize,
        fields: &[Field],
    ) -> Result<HashMap<Field, Arc<[f64]>>> {
        let (lo, hi) = self.species.interval(species)?;

        let mut seen = HashSet::new();
        let missing: Vec<Field> = fields
            .iter()
            .copied()
            .filter(|&f| seen.insert(f) && !self.cache.contains_key(&(species, f)))
            .collect();

        let computed = missing
            .par_iter()
            .map(|&field| {
                self.compute_field(species, field, lo, hi)
                    .map(|values| (field, values))
            })
            .collect::<Result<Vec<_>>>()?;

        for (field, values) in computed {
            self.cache.insert((species, field), values);
        }

        Ok(fields
            .iter()
            .map(|&f| (f, Arc::clone(&self.cache[&(species, f)])))
            .collect())
    }

    fn compute_field(&self, species: usize, field: Field, lo: u64, hi: u64) -> Result<Arc<[f64]>> {
        let n = (hi - lo) as usize;
        let values: Vec<f64> = match field.kind() {
            FieldKind::Stored(plane) => {
                let mut reader = ParticleReader::open(&self.data_path, self.geometry.nrow())?;
                let mut values = reader.read_plane(plane, lo, hi)?;
                if !plane.is_velocity() {
                    // Raw coordinates are grid units with a one-cell offset;
                    // scale_c applies to the normalized value.
                    let ng = f64::from(self.header.ngridc);
                    for v in &mut values {
                        *v = *v / ng - 1.0 / ng;
                    }
                }
                values
            }
            FieldKind::DerivedMass => self.mass_values(species, n),
            FieldKind::DerivedIndex => (lo..hi).map(|i| i as f64).collect(),
            FieldKind::DerivedType => vec![species as f64; n],
        };
        Ok(values.into())
    }

    fn mass_values(&self, species: usize, n: usize) -> Vec<f64> {
        let constant = self.scales.mass_per_species[species] / DOMAIN_DIMENSION_PRODUCT;
        let mut values = vec![constant; n];
        if species == self.species.last_species() {
            if let Some(star_masses) = &self.star_masses {
                let prefix = star_masses.len().min(n);
                values[..prefix].copy_from_slice(&star_masses[..prefix]);
            }
        }
        values
    }
}

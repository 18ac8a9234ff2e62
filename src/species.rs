use crate::error::{ArtError, Result};
use crate::header::ParticleHeader;
use crate::layout::Plane;
use std::fmt;

/// A particle field that can be requested for a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PositionX,
    PositionY,
    PositionZ,
    VelocityX,
    VelocityY,
    VelocityZ,
    Mass,
    Index,
    Type,
}

/// How a field's values are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Read from a data-file plane.
    Stored(Plane),
    /// Constant per species (star prefix excepted).
    DerivedMass,
    /// Absolute global particle indices.
    DerivedIndex,
    /// Species ordinal.
    DerivedType,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Mass,
        Field::Index,
        Field::Type,
        Field::PositionX,
        Field::PositionY,
        Field::PositionZ,
        Field::VelocityX,
        Field::VelocityY,
        Field::VelocityZ,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            Self::PositionX => FieldKind::Stored(Plane::X),
            Self::PositionY => FieldKind::Stored(Plane::Y),
            Self::PositionZ => FieldKind::Stored(Plane::Z),
            Self::VelocityX => FieldKind::Stored(Plane::Vx),
            Self::VelocityY => FieldKind::Stored(Plane::Vy),
            Self::VelocityZ => FieldKind::Stored(Plane::Vz),
            Self::Mass => FieldKind::DerivedMass,
            Self::Index => FieldKind::DerivedIndex,
            Self::Type => FieldKind::DerivedType,
        }
    }

    /// Parse a field name; both the short plane names and the long
    /// `particle_*` forms are accepted.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "x" | "particle_position_x" => Ok(Self::PositionX),
            "y" | "particle_position_y" => Ok(Self::PositionY),
            "z" | "particle_position_z" => Ok(Self::PositionZ),
            "vx" | "particle_velocity_x" => Ok(Self::VelocityX),
            "vy" | "particle_velocity_y" => Ok(Self::VelocityY),
            "vz" | "particle_velocity_z" => Ok(Self::VelocityZ),
            "mass" | "particle_mass" => Ok(Self::Mass),
            "index" | "particle_index" => Ok(Self::Index),
            "type" | "particle_type" => Ok(Self::Type),
            _ => Err(ArtError::UnknownField(name.to_string())),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PositionX => "x",
            Self::PositionY => "y",
            Self::PositionZ => "z",
            Self::VelocityX => "vx",
            Self::VelocityY => "vy",
            Self::VelocityZ => "vz",
            Self::Mass => "mass",
            Self::Index => "index",
            Self::Type => "type",
        };
        write!(f, "{}", name)
    }
}

/// Half-open particle-index intervals owned by each species.
///
/// Built from the active `lspecies` entries: species `s` owns
/// `[lspecies[s-1], lspecies[s])` with `lspecies[-1] := 0`. The intervals
/// partition `[0, total)` exactly; consecutive equal entries give an empty
/// species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesTable {
    bounds: Vec<u64>,
}

impl SpeciesTable {
    /// Build the table from a decoded header, validating that the active
    /// `lspecies` entries are non-decreasing.
    pub fn from_header(header: &ParticleHeader) -> Result<Self> {
        let mut bounds = Vec::with_capacity(header.nspecies as usize);
        let mut prev = 0u64;
        for (index, &l) in header.active_lspecies().iter().enumerate() {
            let next = l as u64;
            if next < prev {
                return Err(ArtError::NonMonotonicSpecies { index, prev, next });
            }
            bounds.push(next);
            prev = next;
        }
        Ok(Self { bounds })
    }

    pub fn species_count(&self) -> usize {
        self.bounds.len()
    }

    /// The half-open global index interval `[lo, hi)` owned by a species.
    pub fn interval(&self, species: usize) -> Result<(u64, u64)> {
        if species >= self.bounds.len() {
            return Err(ArtError::SpeciesOutOfRange {
                species,
                count: self.bounds.len(),
            });
        }
        let lo = if species == 0 {
            0
        } else {
            self.bounds[species - 1]
        };
        Ok((lo, self.bounds[species]))
    }

    /// Number of particles owned by a species.
    pub fn len(&self, species: usize) -> Result<u64> {
        let (lo, hi) = self.interval(species)?;
        Ok(hi - lo)
    }

    pub fn total_particles(&self) -> u64 {
        self.bounds.last().copied().unwrap_or(0)
    }

    /// Index of the species whose interval carries the star prefix.
    pub fn last_species(&self) -> usize {
        self.bounds.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_header;

    #[test]
    fn intervals_partition_total_exactly() {
        let mut header = sample_header();
        header.nspecies = 4;
        header.lspecies[..4].copy_from_slice(&[10, 10, 45, 100]);
        let table = SpeciesTable::from_header(&header).unwrap();

        assert_eq!(table.species_count(), 4);
        let mut covered = 0u64;
        for s in 0..table.species_count() {
            let (lo, hi) = table.interval(s).unwrap();
            assert_eq!(lo, covered);
            covered = hi;
        }
        assert_eq!(covered, table.total_particles());
        assert_eq!(covered, 100);
    }

    #[test]
    fn empty_species_is_allowed() {
        let mut header = sample_header();
        header.nspecies = 3;
        header.lspecies[..3].copy_from_slice(&[50, 50, 80]);
        let table = SpeciesTable::from_header(&header).unwrap();
        assert_eq!(table.interval(1).unwrap(), (50, 50));
        assert_eq!(table.len(1).unwrap(), 0);
    }

    #[test]
    fn decreasing_counts_are_rejected() {
        let mut header = sample_header();
        header.lspecies[..2].copy_from_slice(&[100, 90]);
        assert!(matches!(
            SpeciesTable::from_header(&header),
            Err(ArtError::NonMonotonicSpecies {
                index: 1,
                prev: 100,
                next: 90
            })
        ));
    }

    #[test]
    fn species_index_out_of_range() {
        let table = SpeciesTable::from_header(&sample_header()).unwrap();
        assert!(matches!(
            table.interval(2),
            Err(ArtError::SpeciesOutOfRange {
                species: 2,
                count: 2
            })
        ));
    }

    #[test]
    fn last_species_owns_star_prefix() {
        let table = SpeciesTable::from_header(&sample_header()).unwrap();
        assert_eq!(table.last_species(), 1);
        assert_eq!(table.interval(1).unwrap(), (100, 150));
    }

    #[test]
    fn field_classification() {
        assert_eq!(Field::PositionX.kind(), FieldKind::Stored(Plane::X));
        assert_eq!(Field::VelocityZ.kind(), FieldKind::Stored(Plane::Vz));
        assert_eq!(Field::Mass.kind(), FieldKind::DerivedMass);
        assert_eq!(Field::Index.kind(), FieldKind::DerivedIndex);
        assert_eq!(Field::Type.kind(), FieldKind::DerivedType);
    }

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(&field.to_string()).unwrap(), field);
        }
        assert_eq!(
            Field::from_name("particle_velocity_y").unwrap(),
            Field::VelocityY
        );
        assert!(matches!(
            Field::from_name("particle_spin"),
            Err(ArtError::UnknownField(_))
        ));
    }
}

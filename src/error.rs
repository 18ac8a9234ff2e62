use crate::layout::Plane;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtError {
    #[error("Header truncated: need {expected} bytes, got {actual}")]
    HeaderTruncated { expected: usize, actual: usize },

    #[error("Species count {0} outside the supported range [1, 10]")]
    SpeciesCountOutOfRange(i32),

    #[error("lspecies not non-decreasing at entry {index}: {prev} > {next}")]
    NonMonotonicSpecies { index: usize, prev: u64, next: u64 },

    #[error("Data file size {file_size} is not a whole number of {page_bytes}-byte pages")]
    PageCountNotIntegral { file_size: u64, page_bytes: u64 },

    #[error("Particle range [{start}, {end}) exceeds file capacity of {capacity} particles")]
    RangeOutOfBounds { start: u64, end: u64, capacity: u64 },

    #[error("Plane {plane}: only {resolved} of {requested} requested particles resolved before end of file")]
    RangeUnderrun {
        plane: Plane,
        requested: u64,
        resolved: u64,
    },

    #[error("Short read at byte offset {offset}: wanted {expected} f32 words")]
    ShortRead { offset: u64, expected: u64 },

    #[error("Required {role} file not configured")]
    MissingFile { role: &'static str },

    #[error("Species index {species} out of range (snapshot has {count} species)")]
    SpeciesOutOfRange { species: usize, count: usize },

    #[error("Star count {nstars} exceeds the last species interval ({available} particles)")]
    StarCountExceedsSpecies { nstars: u64, available: u64 },

    #[error("Star mass array has {actual} entries, expected {expected} (= nstars)")]
    StarMassCountMismatch { expected: u64, actual: usize },

    #[error("Unknown particle field: {0:?}")]
    UnknownField(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ArtError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn species_count_display() {
        let err = ArtError::SpeciesCountOutOfRange(12);
        assert_eq!(
            format!("{}", err),
            "Species count 12 outside the supported range [1, 10]"
        );
    }

    #[test]
    fn page_count_display() {
        let err = ArtError::PageCountNotIntegral {
            file_size: 100,
            page_bytes: 96,
        };
        assert_eq!(
            format!("{}", err),
            "Data file size 100 is not a whole number of 96-byte pages"
        );
    }

    #[test]
    fn range_underrun_display() {
        let err = ArtError::RangeUnderrun {
            plane: Plane::Vy,
            requested: 50,
            resolved: 48,
        };
        let display = format!("{}", err);
        assert!(display.contains("vy"));
        assert!(display.contains("48 of 50"));
    }

    #[test]
    fn io_error_conversion() {
        fn fails() -> Result<()> {
            Err(IoError::new(ErrorKind::NotFound, "no such file"))?
        }
        match fails().unwrap_err() {
            ArtError::Io(ref inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
            other => panic!("expected Io variant, got {:?}", other),
        }
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ArtError>();
    }
}

use crate::error::{ArtError, Result};
use crate::layout::{PageGeometry, Plane};
use byteorder::{BigEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

/// Random-access reader over a PMcrs particle data file.
///
/// Holds one file handle; handles must not be shared across concurrent
/// readers, so parallel callers open one reader each (see
/// [`crate::snapshot::Snapshot::load_species`]).
pub struct ParticleReader {
    reader: BufReader<File>,
    geometry: PageGeometry,
}

impl ParticleReader {
    /// Open a data file and derive its page geometry from `nrow` and the
    /// file size.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or its size is not a whole number
    /// of pages.
    pub fn open<P: AsRef<Path>>(path: P, nrow: u32) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let geometry = PageGeometry::new(nrow, file_size)?;
        Ok(Self {
            reader: BufReader::new(file),
            geometry,
        })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Read one plane for particles `[idxa, idxb)`, widened to f64, in
    /// global index order.
    ///
    /// # Errors
    /// Fails if the range exceeds the file-derived particle capacity or a
    /// resolved byte range cannot be read in full.
    pub fn read_plane(&mut self, plane: Plane, idxa: u64, idxb: u64) -> Result<Vec<f64>> {
        let capacity = self.geometry.capacity();
        if idxa > idxb || idxb > capacity {
            return Err(ArtError::RangeOutOfBounds {
                start: idxa,
                end: idxb,
                capacity,
            });
        }

        let count = idxb - idxa;
        let mut values = Vec::with_capacity(count as usize);
        if count == 0 {
            return Ok(values);
        }

        let mut word_buf = Vec::new();
        for range in self.geometry.plane_ranges(idxa, count, plane)? {
            self.reader.seek(SeekFrom::Start(range.offset))?;
            word_buf.resize(range.count as usize, 0f32);
            self.reader
                .read_f32_into::<BigEndian>(&mut word_buf)
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::UnexpectedEof => ArtError::ShortRead {
                        offset: range.offset,
                        expected: range.count,
                    },
                    _ => ArtError::Io(e),
                })?;
            values.extend(word_buf.iter().map(|&v| f64::from(v)));
        }

        debug_assert_eq!(values.len() as u64, count);
        Ok(values)
    }

    /// Read several planes for the same particle range; one array per
    /// plane, in argument order.
    pub fn read_planes(&mut self, planes: &[Plane], idxa: u64, idxb: u64) -> Result<Vec<Vec<f64>>> {
        planes
            .iter()
            .map(|&plane| self.read_plane(plane, idxa, idxb))
            .collect()
    }
}

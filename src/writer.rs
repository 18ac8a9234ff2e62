use crate::error::Result;
use crate::header::ParticleHeader;
use crate::layout::WORDS_PER_PARTICLE;
use byteorder::{BigEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Encoder for PMcrs particle data files.
///
/// Particles are buffered and flushed one page at a time as six interleaved
/// big-endian f32 planes; the final partial page is zero-padded so the file
/// is always a whole number of pages.
pub struct SnapshotWriter {
    writer: BufWriter<File>,
    particles_per_page: usize,
    pending: Vec<[f32; WORDS_PER_PARTICLE as usize]>,
    particles_written: u64,
}

impl SnapshotWriter {
    pub fn create<P: AsRef<Path>>(path: P, nrow: u32) -> Result<Self> {
        let file = File::create(path)?;
        let particles_per_page = (nrow as usize) * (nrow as usize);
        Ok(Self {
            writer: BufWriter::new(file),
            particles_per_page,
            pending: Vec::with_capacity(particles_per_page),
            particles_written: 0,
        })
    }

    /// Queue one particle's (x, y, z, vx, vy, vz); a full page is written
    /// out as soon as it completes.
    pub fn write_particle(&mut self, words: [f32; WORDS_PER_PARTICLE as usize]) -> Result<()> {
        self.pending.push(words);
        self.particles_written += 1;
        if self.pending.len() == self.particles_per_page {
            self.flush_page()?;
        }
        Ok(())
    }

    /// Zero-pad and write any partial page, flush, and return the number of
    /// particles written.
    pub fn finalize(mut self) -> Result<u64> {
        if !self.pending.is_empty() {
            self.pending
                .resize(self.particles_per_page, [0.0; WORDS_PER_PARTICLE as usize]);
            self.flush_page()?;
        }
        self.writer.flush()?;
        Ok(self.particles_written)
    }

    fn flush_page(&mut self) -> Result<()> {
        // Transpose the buffered particles into plane-major order.
        for plane in 0..WORDS_PER_PARTICLE as usize {
            for particle in &self.pending {
                self.writer.write_f32::<BigEndian>(particle[plane])?;
            }
        }
        self.pending.clear();
        Ok(())
    }
}

/// Write a PMcrd header file: the fixed schedule and nothing else.
pub fn write_header<P: AsRef<Path>>(path: P, header: &ParticleHeader) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(&header.to_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PageGeometry, Plane};
    use crate::reader::ParticleReader;
    use tempfile::TempDir;

    #[test]
    fn round_trip_through_reader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PMcrs0.DAT");

        let mut writer = SnapshotWriter::create(&path, 2).unwrap();
        for i in 0..10u32 {
            let base = i as f32;
            writer
                .write_particle([
                    base,
                    base + 0.125,
                    base + 0.25,
                    -base,
                    base * 2.0,
                    base * 3.0,
                ])
                .unwrap();
        }
        assert_eq!(writer.finalize().unwrap(), 10);

        // 10 particles at 4/page round up to 3 pages.
        let mut reader = ParticleReader::open(&path, 2).unwrap();
        assert_eq!(reader.geometry().pages(), 3);
        assert_eq!(reader.geometry().capacity(), 12);

        let ys = reader.read_plane(Plane::Y, 0, 10).unwrap();
        let expected: Vec<f64> = (0..10).map(|i| f64::from(i as f32 + 0.125)).collect();
        assert_eq!(ys, expected);

        let vxs = reader.read_plane(Plane::Vx, 0, 10).unwrap();
        let expected: Vec<f64> = (0..10).map(|i| f64::from(-(i as f32))).collect();
        assert_eq!(vxs, expected);

        // Padding tail reads back as zeros.
        let tail = reader.read_plane(Plane::X, 10, 12).unwrap();
        assert_eq!(tail, vec![0.0, 0.0]);
    }

    #[test]
    fn exact_page_multiple_needs_no_padding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PMcrs0.DAT");

        let mut writer = SnapshotWriter::create(&path, 2).unwrap();
        for i in 0..8u32 {
            writer.write_particle([i as f32; 6]).unwrap();
        }
        writer.finalize().unwrap();

        let size = std::fs::metadata(&path).unwrap().len();
        let geom = PageGeometry::new(2, size).unwrap();
        assert_eq!(geom.pages(), 2);
    }

    #[test]
    fn header_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PMcrd.DAT");
        let header = crate::test_utils::sample_header();

        write_header(&path, &header).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), crate::header::HEADER_SIZE);
        assert_eq!(ParticleHeader::from_bytes(&bytes).unwrap(), header);
    }
}

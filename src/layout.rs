use crate::error::{ArtError, Result};
use std::fmt;

/// f32 words stored per particle in each page: x, y, z, vx, vy, vz.
pub const WORDS_PER_PARTICLE: u64 = 6;
/// Size of one on-disk word (big-endian IEEE-754 f32).
pub const BYTES_PER_WORD: u64 = 4;

/// One of the six interleaved planes of a particle page, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    X = 0,
    Y = 1,
    Z = 2,
    Vx = 3,
    Vy = 4,
    Vz = 5,
}

impl Plane {
    pub const ALL: [Plane; 6] = [
        Plane::X,
        Plane::Y,
        Plane::Z,
        Plane::Vx,
        Plane::Vy,
        Plane::Vz,
    ];

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            "vx" => Ok(Self::Vx),
            "vy" => Ok(Self::Vy),
            "vz" => Ok(Self::Vz),
            _ => Err(ArtError::UnknownField(name.to_string())),
        }
    }

    /// Position of this plane within a page, 0..6.
    pub fn index(self) -> u64 {
        self as u64
    }

    pub fn is_velocity(self) -> bool {
        matches!(self, Self::Vx | Self::Vy | Self::Vz)
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Vx => "vx",
            Self::Vy => "vy",
            Self::Vz => "vz",
        };
        write!(f, "{}", name)
    }
}

/// A contiguous run of f32 words to read from the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Absolute byte offset of the first word.
    pub offset: u64,
    /// Number of f32 words (particles) covered.
    pub count: u64,
}

/// Page geometry of a PMcrs particle data file.
///
/// The file is a sequence of fixed-size pages; each page holds `nrow^2`
/// particles as six interleaved planes (x, y, z, vx, vy, vz), each plane a
/// contiguous run of big-endian f32 for every particle in the page. Species
/// boundaries are independent of page boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    nrow: u32,
    particles_per_page: u64,
    pages: u64,
}

impl PageGeometry {
    /// Derive the geometry from the header's `Nrow` and the data file size.
    ///
    /// # Errors
    /// Fails if the file size is not an exact multiple of the page size.
    pub fn new(nrow: u32, file_size: u64) -> Result<Self> {
        let particles_per_page = u64::from(nrow) * u64::from(nrow);
        let page_bytes = particles_per_page * WORDS_PER_PARTICLE * BYTES_PER_WORD;
        if page_bytes == 0 || !file_size.is_multiple_of(page_bytes) {
            return Err(ArtError::PageCountNotIntegral {
                file_size,
                page_bytes,
            });
        }
        Ok(Self {
            nrow,
            particles_per_page,
            pages: file_size / page_bytes,
        })
    }

    pub fn nrow(&self) -> u32 {
        self.nrow
    }

    pub fn particles_per_page(&self) -> u64 {
        self.particles_per_page
    }

    pub fn pages(&self) -> u64 {
        self.pages
    }

    /// Size of one full page in bytes.
    pub fn page_bytes(&self) -> u64 {
        self.particles_per_page * WORDS_PER_PARTICLE * BYTES_PER_WORD
    }

    /// Particle slots in the file, including any zero-padded tail of the
    /// last page.
    pub fn capacity(&self) -> u64 {
        self.pages * self.particles_per_page
    }

    /// Translate particles `[skip, skip + count)` of one plane into the
    /// minimal ordered list of byte ranges to read.
    ///
    /// Walks pages in ascending order; within each page the requested plane
    /// is one contiguous run, so at most one range is emitted per page. The
    /// ranges are non-overlapping and cover exactly `count` words, in index
    /// order.
    ///
    /// # Errors
    /// Fails if the file ends before `count` particles are resolved.
    pub fn plane_ranges(&self, skip: u64, count: u64, plane: Plane) -> Result<Vec<ByteRange>> {
        let plane_bytes = self.particles_per_page * BYTES_PER_WORD;
        let mut ranges = Vec::new();
        let mut skip = skip;
        let mut remaining = count;

        for page in 0..self.pages {
            if remaining == 0 {
                break;
            }
            if skip >= self.particles_per_page {
                skip -= self.particles_per_page;
                continue;
            }
            let plane_start = page * self.page_bytes() + plane.index() * plane_bytes;
            let take = (self.particles_per_page - skip).min(remaining);
            ranges.push(ByteRange {
                offset: plane_start + skip * BYTES_PER_WORD,
                count: take,
            });
            remaining -= take;
            skip = 0;
        }

        if remaining != 0 {
            return Err(ArtError::RangeUnderrun {
                plane,
                requested: count,
                resolved: count - remaining,
            });
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_from_name_all_variants() {
        assert_eq!(Plane::from_name("x").unwrap(), Plane::X);
        assert_eq!(Plane::from_name("y").unwrap(), Plane::Y);
        assert_eq!(Plane::from_name("z").unwrap(), Plane::Z);
        assert_eq!(Plane::from_name("vx").unwrap(), Plane::Vx);
        assert_eq!(Plane::from_name("vy").unwrap(), Plane::Vy);
        assert_eq!(Plane::from_name("vz").unwrap(), Plane::Vz);
        assert!(matches!(
            Plane::from_name("w"),
            Err(ArtError::UnknownField(_))
        ));
    }

    #[test]
    fn plane_order_matches_disk_layout() {
        for (i, plane) in Plane::ALL.iter().enumerate() {
            assert_eq!(plane.index(), i as u64);
        }
        assert!(Plane::Vx.is_velocity());
        assert!(!Plane::Z.is_velocity());
    }

    #[test]
    fn geometry_rejects_ragged_file() {
        // nrow=2 -> 4 particles/page -> 96 bytes/page
        assert!(matches!(
            PageGeometry::new(2, 100),
            Err(ArtError::PageCountNotIntegral {
                file_size: 100,
                page_bytes: 96
            })
        ));
        assert!(PageGeometry::new(2, 0).is_ok());
        assert!(PageGeometry::new(0, 96).is_err());
    }

    #[test]
    fn geometry_derived_quantities() {
        let geom = PageGeometry::new(2, 96 * 38).unwrap();
        assert_eq!(geom.particles_per_page(), 4);
        assert_eq!(geom.pages(), 38);
        assert_eq!(geom.page_bytes(), 96);
        assert_eq!(geom.capacity(), 152);
    }

    #[test]
    fn single_page_whole_plane() {
        let geom = PageGeometry::new(2, 96).unwrap();
        let ranges = geom.plane_ranges(0, 4, Plane::X).unwrap();
        assert_eq!(ranges, vec![ByteRange { offset: 0, count: 4 }]);

        let ranges = geom.plane_ranges(0, 4, Plane::Vz).unwrap();
        assert_eq!(
            ranges,
            vec![ByteRange {
                offset: 5 * 16,
                count: 4
            }]
        );
    }

    #[test]
    fn skip_within_first_page() {
        let geom = PageGeometry::new(2, 96 * 2).unwrap();
        let ranges = geom.plane_ranges(3, 2, Plane::Y).unwrap();
        // Plane y of page 0 starts at 16; skip 3 particles = 12 bytes.
        assert_eq!(
            ranges,
            vec![
                ByteRange {
                    offset: 16 + 12,
                    count: 1
                },
                ByteRange {
                    offset: 96 + 16,
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn skip_exhausts_whole_pages() {
        let geom = PageGeometry::new(2, 96 * 3).unwrap();
        // Skip pages 0 and 1 entirely, then land mid-page-2.
        let ranges = geom.plane_ranges(9, 2, Plane::X).unwrap();
        assert_eq!(
            ranges,
            vec![ByteRange {
                offset: 2 * 96 + 4,
                count: 2
            }]
        );
    }

    #[test]
    fn spec_scenario_species_one_vy() {
        // Nrow=2, one species interval [100, 150): 13 pages touched
        // (25..=37), 12 full emissions of 4 plus a final 2.
        let geom = PageGeometry::new(2, 96 * 38).unwrap();
        let ranges = geom.plane_ranges(100, 50, Plane::Vy).unwrap();
        assert_eq!(ranges.len(), 13);
        assert_eq!(
            ranges[0],
            ByteRange {
                offset: 25 * 96 + 4 * 16,
                count: 4
            }
        );
        for range in &ranges[..12] {
            assert_eq!(range.count, 4);
        }
        assert_eq!(
            ranges[12],
            ByteRange {
                offset: 37 * 96 + 4 * 16,
                count: 2
            }
        );
        let total: u64 = ranges.iter().map(|r| r.count).sum();
        assert_eq!(total, 50);
    }

    #[test]
    fn ranges_cover_exactly_count_for_all_offsets() {
        let geom = PageGeometry::new(3, 9 * 24 * 5).unwrap();
        let total = geom.capacity();
        for skip in 0..total {
            for count in 1..=(total - skip).min(20) {
                let ranges = geom.plane_ranges(skip, count, Plane::Z).unwrap();
                let covered: u64 = ranges.iter().map(|r| r.count).sum();
                assert_eq!(covered, count, "skip={} count={}", skip, count);
                // Emissions are strictly ordered and non-overlapping.
                for pair in ranges.windows(2) {
                    assert!(pair[0].offset + pair[0].count * BYTES_PER_WORD <= pair[1].offset);
                }
            }
        }
    }

    #[test]
    fn underrun_past_end_of_file() {
        let geom = PageGeometry::new(2, 96).unwrap();
        let err = geom.plane_ranges(2, 4, Plane::X).unwrap_err();
        assert!(matches!(
            err,
            ArtError::RangeUnderrun {
                plane: Plane::X,
                requested: 4,
                resolved: 2
            }
        ));
    }

    #[test]
    fn zero_count_is_empty() {
        let geom = PageGeometry::new(2, 96).unwrap();
        assert!(geom.plane_ranges(0, 0, Plane::X).unwrap().is_empty());
        assert!(geom.plane_ranges(4, 0, Plane::X).unwrap().is_empty());
    }
}

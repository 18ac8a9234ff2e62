use crate::error::{ArtError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, ErrorKind, Read};

/// Leading Fortran record marker, skipped on read.
const RECORD_MARKER_SIZE: usize = 4;
/// Fixed-width ASCII run label following the marker.
pub const LABEL_SIZE: usize = 45;

/// Total size of the fixed header schedule in bytes.
pub const HEADER_SIZE: usize = RECORD_MARKER_SIZE
    + LABEL_SIZE
    + 4 * 4      // aexpn, aexp0, amplt, astep
    + 4          // istep
    + 7 * 4      // partw, tintg, Ekin, Ekin1, Ekin2, au0, aeu0
    + 4 * 4      // Nrow, Ngridc, Nspecies, Nseed
    + 5 * 4      // Om0, Oml0, hubble, Wp5, Ocurv
    + 10 * 4     // wspecies
    + 10 * 4     // lspecies
    + 71 * 4     // extras1
    + 5 * 4      // Rs, Md, Mh, Rd, Consentr
    + 3 * 4      // extras2
    + 4; // boxsize

const _: () = assert!(HEADER_SIZE == 533);

/// Maximum number of particle species the header can describe.
pub const MAX_SPECIES: usize = 10;

/// A seeded parameter that disagrees with the header.
///
/// The header value always wins; mismatches are reported, never fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMismatch {
    pub name: String,
    pub header: f64,
    pub seeded: f64,
}

/// Decoded PMcrd particle header.
///
/// All multi-byte fields are big-endian on disk; scalar widths match the
/// file exactly (f32 / i32). Unit derivation widens to f64 in
/// [`crate::units::ScaleFactors`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleHeader {
    /// ASCII run label, trailing padding stripped.
    pub label: String,
    /// Current expansion factor.
    pub aexpn: f32,
    /// Initial expansion factor.
    pub aexp0: f32,
    pub amplt: f32,
    pub astep: f32,
    pub istep: i32,
    pub partw: f32,
    pub tintg: f32,
    pub ekin: f32,
    pub ekin1: f32,
    pub ekin2: f32,
    pub au0: f32,
    pub aeu0: f32,
    /// Page geometry parameter: each data page holds `nrow^2` particles.
    pub nrow: i32,
    /// Grid resolution.
    pub ngridc: i32,
    /// Number of active particle species, 1..=10.
    pub nspecies: i32,
    pub nseed: i32,
    pub om0: f32,
    pub oml0: f32,
    pub hubble: f32,
    pub wp5: f32,
    pub ocurv: f32,
    /// Mass weight per species; only the first `nspecies` entries are active.
    pub wspecies: [f32; MAX_SPECIES],
    /// Cumulative particle count per species (last global index + 1).
    pub lspecies: [i32; MAX_SPECIES],
    pub extras1: [f32; 71],
    pub rs: f32,
    /// Disk mass extra; feeds the `scale_m` derivation.
    pub md: f32,
    pub mh: f32,
    pub rd: f32,
    pub consentr: f32,
    pub extras2: [f32; 3],
    /// Comoving box size.
    pub boxsize: f32,
}

impl ParticleHeader {
    /// Decode a header from at least [`HEADER_SIZE`] bytes.
    ///
    /// # Errors
    /// Fails if the buffer is shorter than the schedule or `nspecies` is
    /// outside [1, 10].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArtError::HeaderTruncated {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut cursor = Cursor::new(bytes);
        let _marker = cursor.read_u32::<BigEndian>()?;

        let mut label_bytes = [0u8; LABEL_SIZE];
        cursor.read_exact(&mut label_bytes)?;
        let label = String::from_utf8_lossy(&label_bytes)
            .trim_end_matches(|c: char| c == ' ' || c == '\0')
            .to_string();

        let aexpn = cursor.read_f32::<BigEndian>()?;
        let aexp0 = cursor.read_f32::<BigEndian>()?;
        let amplt = cursor.read_f32::<BigEndian>()?;
        let astep = cursor.read_f32::<BigEndian>()?;
        let istep = cursor.read_i32::<BigEndian>()?;
        let partw = cursor.read_f32::<BigEndian>()?;
        let tintg = cursor.read_f32::<BigEndian>()?;
        let ekin = cursor.read_f32::<BigEndian>()?;
        let ekin1 = cursor.read_f32::<BigEndian>()?;
        let ekin2 = cursor.read_f32::<BigEndian>()?;
        let au0 = cursor.read_f32::<BigEndian>()?;
        let aeu0 = cursor.read_f32::<BigEndian>()?;
        let nrow = cursor.read_i32::<BigEndian>()?;
        let ngridc = cursor.read_i32::<BigEndian>()?;
        let nspecies = cursor.read_i32::<BigEndian>()?;
        let nseed = cursor.read_i32::<BigEndian>()?;
        let om0 = cursor.read_f32::<BigEndian>()?;
        let oml0 = cursor.read_f32::<BigEndian>()?;
        let hubble = cursor.read_f32::<BigEndian>()?;
        let wp5 = cursor.read_f32::<BigEndian>()?;
        let ocurv = cursor.read_f32::<BigEndian>()?;

        let mut wspecies = [0f32; MAX_SPECIES];
        cursor.read_f32_into::<BigEndian>(&mut wspecies)?;
        let mut lspecies = [0i32; MAX_SPECIES];
        cursor.read_i32_into::<BigEndian>(&mut lspecies)?;
        let mut extras1 = [0f32; 71];
        cursor.read_f32_into::<BigEndian>(&mut extras1)?;

        let rs = cursor.read_f32::<BigEndian>()?;
        let md = cursor.read_f32::<BigEndian>()?;
        let mh = cursor.read_f32::<BigEndian>()?;
        let rd = cursor.read_f32::<BigEndian>()?;
        let consentr = cursor.read_f32::<BigEndian>()?;
        let mut extras2 = [0f32; 3];
        cursor.read_f32_into::<BigEndian>(&mut extras2)?;
        let boxsize = cursor.read_f32::<BigEndian>()?;

        if !(1..=MAX_SPECIES as i32).contains(&nspecies) {
            return Err(ArtError::SpeciesCountOutOfRange(nspecies));
        }

        Ok(Self {
            label,
            aexpn,
            aexp0,
            amplt,
            astep,
            istep,
            partw,
            tintg,
            ekin,
            ekin1,
            ekin2,
            au0,
            aeu0,
            nrow,
            ngridc,
            nspecies,
            nseed,
            om0,
            oml0,
            hubble,
            wp5,
            ocurv,
            wspecies,
            lspecies,
            extras1,
            rs,
            md,
            mh,
            rd,
            consentr,
            extras2,
            boxsize,
        })
    }

    /// Decode a header from a stream, reading exactly [`HEADER_SIZE`] bytes.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        let mut filled = 0;
        while filled < HEADER_SIZE {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(ArtError::HeaderTruncated {
                        expected: HEADER_SIZE,
                        actual: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Self::from_bytes(&buf)
    }

    /// Re-encode the header into its on-disk form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        // Writes into a Vec cannot fail.
        buf.write_u32::<BigEndian>(0).unwrap();

        let mut label_bytes = [b' '; LABEL_SIZE];
        let copy_len = self.label.len().min(LABEL_SIZE);
        label_bytes[..copy_len].copy_from_slice(&self.label.as_bytes()[..copy_len]);
        buf.extend_from_slice(&label_bytes);

        for value in [
            self.aexpn, self.aexp0, self.amplt, self.astep,
        ] {
            buf.write_f32::<BigEndian>(value).unwrap();
        }
        buf.write_i32::<BigEndian>(self.istep).unwrap();
        for value in [
            self.partw, self.tintg, self.ekin, self.ekin1, self.ekin2, self.au0, self.aeu0,
        ] {
            buf.write_f32::<BigEndian>(value).unwrap();
        }
        for value in [self.nrow, self.ngridc, self.nspecies, self.nseed] {
            buf.write_i32::<BigEndian>(value).unwrap();
        }
        for value in [self.om0, self.oml0, self.hubble, self.wp5, self.ocurv] {
            buf.write_f32::<BigEndian>(value).unwrap();
        }
        for value in self.wspecies {
            buf.write_f32::<BigEndian>(value).unwrap();
        }
        for value in self.lspecies {
            buf.write_i32::<BigEndian>(value).unwrap();
        }
        for value in self.extras1 {
            buf.write_f32::<BigEndian>(value).unwrap();
        }
        for value in [self.rs, self.md, self.mh, self.rd, self.consentr] {
            buf.write_f32::<BigEndian>(value).unwrap();
        }
        for value in self.extras2 {
            buf.write_f32::<BigEndian>(value).unwrap();
        }
        buf.write_f32::<BigEndian>(self.boxsize).unwrap();

        debug_assert_eq!(buf.len(), HEADER_SIZE);
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(&buf);
        out
    }

    /// Active entries of `wspecies`.
    pub fn active_wspecies(&self) -> &[f32] {
        &self.wspecies[..self.nspecies as usize]
    }

    /// Active entries of `lspecies`.
    pub fn active_lspecies(&self) -> &[i32] {
        &self.lspecies[..self.nspecies as usize]
    }

    /// Total particle count across all species.
    pub fn total_particles(&self) -> u64 {
        self.active_lspecies()
            .last()
            .map(|&n| n as u64)
            .unwrap_or(0)
    }

    /// Named scalar parameters, widened to f64, under their conventional
    /// header names.
    pub fn parameters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("aexpn", f64::from(self.aexpn)),
            ("aexp0", f64::from(self.aexp0)),
            ("amplt", f64::from(self.amplt)),
            ("astep", f64::from(self.astep)),
            ("istep", f64::from(self.istep)),
            ("partw", f64::from(self.partw)),
            ("tintg", f64::from(self.tintg)),
            ("Ekin", f64::from(self.ekin)),
            ("Ekin1", f64::from(self.ekin1)),
            ("Ekin2", f64::from(self.ekin2)),
            ("au0", f64::from(self.au0)),
            ("aeu0", f64::from(self.aeu0)),
            ("Nrow", f64::from(self.nrow)),
            ("Ngridc", f64::from(self.ngridc)),
            ("Nspecies", f64::from(self.nspecies)),
            ("Nseed", f64::from(self.nseed)),
            ("Om0", f64::from(self.om0)),
            ("Oml0", f64::from(self.oml0)),
            ("hubble", f64::from(self.hubble)),
            ("Wp5", f64::from(self.wp5)),
            ("Ocurv", f64::from(self.ocurv)),
            ("Rs", f64::from(self.rs)),
            ("Md", f64::from(self.md)),
            ("Mh", f64::from(self.mh)),
            ("Rd", f64::from(self.rd)),
            ("Consentr", f64::from(self.consentr)),
            ("boxsize", f64::from(self.boxsize)),
        ]
    }

    /// Compare named header scalars against externally seeded values.
    ///
    /// Only names present in both sets are compared; a differing pair is
    /// returned as a [`ParameterMismatch`]. Seeded names with no header
    /// counterpart are ignored.
    pub fn reconcile(&self, seeded: &HashMap<String, f64>) -> Vec<ParameterMismatch> {
        self.parameters()
            .into_iter()
            .filter_map(|(name, header)| {
                let &expected = seeded.get(name)?;
                (header != expected).then(|| ParameterMismatch {
                    name: name.to_string(),
                    header,
                    seeded: expected,
                })
            })
            .collect()
    }
}

impl Default for ParticleHeader {
    fn default() -> Self {
        Self {
            label: String::new(),
            aexpn: 1.0,
            aexp0: 1.0,
            amplt: 0.0,
            astep: 0.0,
            istep: 0,
            partw: 0.0,
            tintg: 0.0,
            ekin: 0.0,
            ekin1: 0.0,
            ekin2: 0.0,
            au0: 0.0,
            aeu0: 0.0,
            nrow: 1,
            ngridc: 1,
            nspecies: 1,
            nseed: 0,
            om0: 1.0,
            oml0: 0.0,
            hubble: 1.0,
            wp5: 0.0,
            ocurv: 0.0,
            wspecies: [0.0; MAX_SPECIES],
            lspecies: [0; MAX_SPECIES],
            extras1: [0.0; 71],
            rs: 0.0,
            md: 0.0,
            mh: 0.0,
            rd: 0.0,
            consentr: 0.0,
            extras2: [0.0; 3],
            boxsize: 1.0,
        }
    }
}

impl fmt::Display for ParticleHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Label: {}", self.label)?;
        writeln!(f, "Expansion factor: {} (initial {})", self.aexpn, self.aexp0)?;
        writeln!(f, "Step: {}", self.istep)?;
        writeln!(f, "Nrow: {} ({} particles/page)", self.nrow, i64::from(self.nrow) * i64::from(self.nrow))?;
        writeln!(f, "Grid: {}^3", self.ngridc)?;
        writeln!(f, "Species: {}", self.nspecies)?;
        for (i, (&w, &l)) in self
            .active_wspecies()
            .iter()
            .zip(self.active_lspecies())
            .enumerate()
        {
            writeln!(f, "  specie{}: weight {:.6e}, cumulative count {}", i, w, l)?;
        }
        writeln!(
            f,
            "Cosmology: Om0 {} Oml0 {} h {} Ocurv {}",
            self.om0, self.oml0, self.hubble, self.ocurv
        )?;
        write!(f, "Box size: {} Mpc/h", self.boxsize)
    }
}

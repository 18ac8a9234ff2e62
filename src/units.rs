use crate::header::ParticleHeader;

/// Physical unit conversions derived from a [`ParticleHeader`].
///
/// Pure functions of the header (plus the externally supplied star count);
/// recomputed identically on every load, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleFactors {
    /// km/s per raw velocity unit: `boxsize * 100 / aexpn / ngridc`.
    pub scale_v: f64,
    /// kpc per raw (grid-normalized) coordinate unit:
    /// `aexpn / hubble * 1000 * boxsize`. Raw coordinates are already
    /// divided by the grid resolution during record extraction, not here.
    pub scale_c: f64,
    /// Solar masses per raw star mass unit: `Md / nstars / hubble`.
    ///
    /// The `Md`-derived formula is preserved literally from the original
    /// code; it is not re-derived from first principles.
    pub scale_m: f64,
    /// Physical mass per particle of each active species:
    /// `wspecies[s] * boxsize^3 / ngridc^3 * Om0 / hubble / 3.64e-12`.
    pub mass_per_species: Vec<f64>,
}

impl ScaleFactors {
    pub fn derive(header: &ParticleHeader, nstars: u64) -> Self {
        let aexpn = f64::from(header.aexpn);
        let ngridc = f64::from(header.ngridc);
        let hubble = f64::from(header.hubble);
        let om0 = f64::from(header.om0);
        let boxsize = f64::from(header.boxsize);

        let scale_v = boxsize * 100.0 / aexpn / ngridc;
        let scale_c = aexpn / hubble * 1000.0 * boxsize;
        let scale_m = f64::from(header.md) / nstars as f64 / hubble;

        let mass_unit = boxsize.powi(3) / ngridc.powi(3) * om0 / hubble / 3.64e-12;
        let mass_per_species = header
            .active_wspecies()
            .iter()
            .map(|&w| f64::from(w) * mass_unit)
            .collect();

        Self {
            scale_v,
            scale_c,
            scale_m,
            mass_per_species,
        }
    }
}

//! Tolerances and numeric defaults shared by every module.
//!
//! Policy
//! - One epsilon (`GeomCfg::eps`) drives normalization, "on the locus" checks
//!   and point distinctness. Solver residuals use `eps²` so that roots are
//!   accurate well below the distinctness threshold.
//! - Constants that callers never tune (difference step, quadrature nodes)
//!   stay fixed here instead of on the config struct.

/// Step of the symmetric difference quotient in `numerics::derivative`.
pub const DIFF_STEP: f64 = 1e-5;
/// Node count of the composite Simpson rule (must be even).
pub const SIMPSON_NODES: usize = 16;
/// Seed of the RNG used to jitter Newton iterations off flat spots.
pub const JITTER_SEED: u64 = 0x6a09_e667_f3bc_c908;

/// Geometry configuration (tolerances and iteration budgets).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomCfg {
    /// Homogeneous normalization threshold and distinctness tolerance.
    pub eps: f64,
    /// Hard iteration cap for every iterative solver.
    pub max_iter: usize,
    /// Target spacing (user units) between curve samples during root scans.
    pub sample_spacing: f64,
    pub min_samples: usize,
    pub max_samples: usize,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps: 1e-4,
            max_iter: 80,
            sample_spacing: 0.05,
            min_samples: 16,
            max_samples: 512,
        }
    }
}

impl GeomCfg {
    /// Residual tolerance for root finding.
    #[inline]
    pub fn root_tol(&self) -> f64 {
        self.eps * self.eps
    }

    /// Number of scan intervals for a curve of the given arc length.
    pub fn samples_for_length(&self, length: f64) -> usize {
        if !length.is_finite() || self.sample_spacing <= 0.0 {
            return self.max_samples;
        }
        let n = (length / self.sample_spacing).ceil() as usize;
        n.clamp(self.min_samples, self.max_samples.max(self.min_samples))
    }
}

//! Screened-Coulomb double-layer kernel evaluations
//!
//! Two forms of the same kernel feed the four interaction kinds. The
//! direct (particle-particle) form combines the four layer potentials
//! L₁..L₄ acting on the old iterate. The cluster form is the restructured
//! scalar+vector identity shared by the particle-cluster,
//! cluster-particle and cluster-cluster interactions.
//!
//! Throughout, r = source − target.

use crate::core::constants::ONE_OVER_4PI;
use crate::core::types::PhysicsParams;

/// The four layer-potential combinations of one source/target pair
#[derive(Debug, Clone, Copy)]
pub struct LayerKernels {
    /// G₁ − ε·G₂
    pub l1: f64,
    /// G₀ − G_κ
    pub l2: f64,
    /// G₄ − G₃
    pub l3: f64,
    /// G₁₀ − G₂₀/ε
    pub l4: f64,
}

/// Evaluate the layer kernels for one pair; `None` for coincident points
/// (the self-pair of the direct sum is skipped)
#[inline]
pub fn layer_kernels(
    phys: &PhysicsParams,
    target: [f64; 3],
    target_normal: [f64; 3],
    source: [f64; 3],
    source_normal: [f64; 3],
) -> Option<LayerKernels> {
    let dist_x = source[0] - target[0];
    let dist_y = source[1] - target[1];
    let dist_z = source[2] - target[2];

    let r2 = dist_x * dist_x + dist_y * dist_y + dist_z * dist_z;
    if r2 <= 0.0 {
        return None;
    }

    let r = r2.sqrt();
    let one_over_r = 1.0 / r;

    let g0 = ONE_OVER_4PI * one_over_r;
    let kappa_r = phys.kappa * r;
    let exp_kappa_r = (-kappa_r).exp();
    let gk = exp_kappa_r * g0;

    let cos_theta = (source_normal[0] * dist_x
        + source_normal[1] * dist_y
        + source_normal[2] * dist_z)
        * one_over_r;
    let cos_theta0 = (target_normal[0] * dist_x
        + target_normal[1] * dist_y
        + target_normal[2] * dist_z)
        * one_over_r;

    let tp1 = g0 * one_over_r;
    let tp2 = (1.0 + kappa_r) * exp_kappa_r;

    let g10 = cos_theta0 * tp1;
    let g20 = tp2 * g10;

    let g1 = cos_theta * tp1;
    let g2 = tp2 * g1;

    let dot_tqsq = source_normal[0] * target_normal[0]
        + source_normal[1] * target_normal[1]
        + source_normal[2] * target_normal[2];
    let g3 = (dot_tqsq - 3.0 * cos_theta0 * cos_theta) * one_over_r * tp1;
    let g4 = tp2 * g3 - phys.kappa2 * cos_theta0 * cos_theta * gk;

    Some(LayerKernels {
        l1: g1 - phys.eps * g2,
        l2: g0 - gk,
        l3: g4 - g3,
        l4: g10 - g20 / phys.eps,
    })
}

/// Distance-dependent terms of the cluster kernel identity
#[derive(Debug, Clone, Copy)]
pub struct ClusterTerms {
    /// dinv·(1 − e^{−κd})
    pub scalar: f64,
    /// −d³inv + ε·d³inv·e^{−κd}·(1+κd)
    pub d1term1: f64,
    /// −d³inv + d³inv·e^{−κd}·(1+κd)/ε
    pub d1term2: f64,
    /// d⁵inv·(−3 + e^{−κd}·(3 + 3κd + κ²d²))
    pub d2term: f64,
    /// d³inv·(1 − e^{−κd}·(1+κd))
    pub d3term: f64,
}

/// Evaluate the cluster kernel terms for one displacement
#[inline]
pub fn cluster_terms(phys: &PhysicsParams, dx: f64, dy: f64, dz: f64) -> ClusterTerms {
    let r2 = dx * dx + dy * dy + dz * dz;
    let r = r2.sqrt();
    let rinv = 1.0 / r;
    let r3inv = rinv * rinv * rinv;
    let r5inv = r3inv * rinv * rinv;

    let kappa_r = phys.kappa * r;
    let expkr = (-kappa_r).exp();
    let d1term = r3inv * expkr * (1.0 + kappa_r);

    ClusterTerms {
        scalar: rinv * (1.0 - expkr),
        d1term1: -r3inv + d1term * phys.eps,
        d1term2: -r3inv + d1term / phys.eps,
        d2term: r5inv * (-3.0 + expkr * (3.0 + 3.0 * kappa_r + phys.kappa2 * r2)),
        d3term: r3inv * (1.0 - expkr * (1.0 + kappa_r)),
    }
}

/// Fold one charge quadruple through the cluster identity into the four
/// potential accumulators
#[inline]
pub fn accumulate_cluster(
    terms: &ClusterTerms,
    dx: f64,
    dy: f64,
    dz: f64,
    q: f64,
    q_dx: f64,
    q_dy: f64,
    q_dz: f64,
    acc: &mut [f64; 4],
) {
    acc[0] += terms.scalar * q + terms.d1term1 * (q_dx * dx + q_dy * dy + q_dz * dz);

    acc[1] += q * terms.d1term2 * dx
        - (q_dx * (dx * dx * terms.d2term + terms.d3term)
            + q_dy * (dx * dy * terms.d2term)
            + q_dz * (dx * dz * terms.d2term));

    acc[2] += q * terms.d1term2 * dy
        - (q_dx * (dx * dy * terms.d2term)
            + q_dy * (dy * dy * terms.d2term + terms.d3term)
            + q_dz * (dy * dz * terms.d2term));

    acc[3] += q * terms.d1term2 * dz
        - (q_dx * (dx * dz * terms.d2term)
            + q_dy * (dy * dz * terms.d2term)
            + q_dz * (dz * dz * terms.d2term + terms.d3term));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_phys() -> PhysicsParams {
        PhysicsParams::new(1.0, 80.0, 0.15, 298.15)
    }

    #[test]
    fn test_self_pair_skipped() {
        let phys = test_phys();
        let p = [1.0, 2.0, 3.0];
        let n = [0.0, 0.0, 1.0];
        assert!(layer_kernels(&phys, p, n, p, n).is_none());
    }

    #[test]
    fn test_kappa_zero_reduces_to_coulomb() {
        // With κ = 0 the screening factors collapse: L2 = 0 and
        // L1 = G1·(1 − ε)
        let phys = PhysicsParams::new(1.0, 80.0, 0.0, 298.15);

        let target = [0.0, 0.0, 0.0];
        let tn = [0.0, 0.0, 1.0];
        let source = [0.0, 0.0, 2.0];
        let sn = [0.0, 0.0, 1.0];

        let k = layer_kernels(&phys, target, tn, source, sn).unwrap();

        let g0 = ONE_OVER_4PI / 2.0;
        let g1 = 1.0 * g0 / 2.0;
        assert_relative_eq!(k.l2, 0.0, epsilon = 1e-14);
        assert_relative_eq!(k.l1, g1 * (1.0 - phys.eps), max_relative = 1e-12);
    }

    #[test]
    fn test_screening_decays_monopole() {
        let phys = test_phys();
        let target = [0.0, 0.0, 0.0];
        let tn = [1.0, 0.0, 0.0];
        let sn = [1.0, 0.0, 0.0];

        let near = layer_kernels(&phys, target, tn, [1.0, 0.0, 0.0], sn).unwrap();
        let far = layer_kernels(&phys, target, tn, [10.0, 0.0, 0.0], sn).unwrap();

        // L2 = G0 - Gk > 0, decaying with distance
        assert!(near.l2 > 0.0);
        assert!(far.l2 > 0.0);
        assert!(far.l2 < near.l2);
    }

    #[test]
    fn test_cluster_terms_match_layer_combination() {
        // The restructured scalar term dinv·(1−e^{−κd}) equals
        // 4π·(G0 − Gk)
        let phys = test_phys();
        let (dx, dy, dz) = (1.3, -0.4, 2.1);

        let terms = cluster_terms(&phys, dx, dy, dz);
        let target = [0.0, 0.0, 0.0];
        let source = [-dx, -dy, -dz];
        let n = [0.0, 0.0, 1.0];
        let k = layer_kernels(&phys, target, n, source, n).unwrap();

        assert_relative_eq!(
            terms.scalar * ONE_OVER_4PI,
            k.l2,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_accumulate_cluster_pure_monopole() {
        let phys = test_phys();
        let (dx, dy, dz) = (0.5, 1.0, -2.0);
        let terms = cluster_terms(&phys, dx, dy, dz);

        let mut acc = [0.0; 4];
        accumulate_cluster(&terms, dx, dy, dz, 2.0, 0.0, 0.0, 0.0, &mut acc);

        assert_relative_eq!(acc[0], 2.0 * terms.scalar, epsilon = 1e-14);
        assert_relative_eq!(acc[1], 2.0 * terms.d1term2 * dx, epsilon = 1e-14);
        assert_relative_eq!(acc[2], 2.0 * terms.d1term2 * dy, epsilon = 1e-14);
        assert_relative_eq!(acc[3], 2.0 * terms.d1term2 * dz, epsilon = 1e-14);
    }
}

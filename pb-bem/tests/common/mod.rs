//! Shared fixtures for the integration tests

#![allow(dead_code)]

use pb_bem::Params;
use pb_bem::core::constants::ONE_OVER_4PI;
use pb_bem::core::mesh::elements::Elements;
use pb_bem::core::types::PhysicsParams;

/// Parse a parameter set for in-memory solves; the pqr path is unused by
/// `solve_prepared`.
pub fn test_params(extra: &str) -> Params {
    let base = format!("mol unused.pqr\n{extra}");
    Params::from_str_contents(&base).expect("valid test parameters")
}

/// Default physics of the test problems: ε_p = 1, ε_w = 80, 0.15 M, 298.15 K
pub fn test_phys() -> PhysicsParams {
    PhysicsParams::new(1.0, 80.0, 0.15, 298.15)
}

/// Dense O(N²) reference for the boundary-integral operator, written
/// directly from the kernel definitions and independent of the treecode
/// code paths.
pub fn dense_reference_apply(elements: &Elements, phys: &PhysicsParams, x: &[f64]) -> Vec<f64> {
    let num = elements.num();
    let c1 = 0.5 * (1.0 + phys.eps);
    let c2 = 0.5 * (1.0 + 1.0 / phys.eps);

    let mut y = vec![0.0; 2 * num];

    for j in 0..num {
        let tp = [elements.x[j], elements.y[j], elements.z[j]];
        let tq = [elements.nx[j], elements.ny[j], elements.nz[j]];

        let mut peng = [0.0_f64; 2];

        for k in 0..num {
            if k == j {
                continue;
            }

            let sp = [elements.x[k], elements.y[k], elements.z[k]];
            let sq = [elements.nx[k], elements.ny[k], elements.nz[k]];

            let r_s = [sp[0] - tp[0], sp[1] - tp[1], sp[2] - tp[2]];
            let sumrs = r_s[0] * r_s[0] + r_s[1] * r_s[1] + r_s[2] * r_s[2];
            let rs = sumrs.sqrt();
            let irs = 1.0 / rs;

            let g0 = ONE_OVER_4PI * irs;
            let kappa_rs = phys.kappa * rs;
            let exp_kappa_rs = (-kappa_rs).exp();
            let gk = exp_kappa_rs * g0;

            let cos_theta = (sq[0] * r_s[0] + sq[1] * r_s[1] + sq[2] * r_s[2]) * irs;
            let cos_theta0 = (tq[0] * r_s[0] + tq[1] * r_s[1] + tq[2] * r_s[2]) * irs;

            let tp1 = g0 * irs;
            let tp2 = (1.0 + kappa_rs) * exp_kappa_rs;

            let g10 = cos_theta0 * tp1;
            let g20 = tp2 * g10;
            let g1 = cos_theta * tp1;
            let g2 = tp2 * g1;

            let dot_tqsq = sq[0] * tq[0] + sq[1] * tq[1] + sq[2] * tq[2];
            let g3 = (dot_tqsq - 3.0 * cos_theta0 * cos_theta) * irs * tp1;
            let g4 = tp2 * g3 - phys.kappa2 * cos_theta0 * cos_theta * gk;

            let l1 = g1 - phys.eps * g2;
            let l2 = g0 - gk;
            let l3 = g4 - g3;
            let l4 = g10 - g20 / phys.eps;

            let area = elements.area[k];
            peng[0] += (l1 * x[k] + l2 * x[num + k]) * area;
            peng[1] += (l3 * x[k] + l4 * x[num + k]) * area;
        }

        y[j] = c1 * x[j] - peng[0];
        y[num + j] = c2 * x[num + j] - peng[1];
    }

    y
}

/// Infinity norm of a slice
pub fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |m, &x| m.max(x.abs()))
}

//! Run configuration from a `key value` parameter file
//!
//! The parameter file holds one case-insensitive `key value` pair per line.
//! Unknown keys are logged and skipped; malformed or out-of-range values for
//! recognized keys fail fast with [`BemError::Config`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::BemError;
use crate::core::types::{MeshFormat, MeshKind, OutputKind, PhysicsParams};

/// Full run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// PQR file with atom coordinates, charges and radii
    pub pqr_path: PathBuf,

    /// Surface definition handed to the mesher
    pub mesh: MeshKind,
    /// On-disk mesh format
    pub mesh_format: MeshFormat,
    /// Mesher grid scale (vertex density, Å⁻²)
    pub mesh_density: f64,
    /// Solvent probe radius (Å)
    pub mesh_probe_radius: f64,
    /// Prefix of a pre-built mesh; empty means "invoke the mesher"
    pub input_mesh_prefix: String,

    /// Physical parameters with derived ε, κ, κ²
    pub phys: PhysicsParams,

    /// Interpolation degree p of the treecode (p+1 Chebyshev points per axis)
    pub tree_degree: usize,
    /// Multipole acceptance parameter θ ∈ [0, 1]
    pub tree_theta: f64,
    /// Maximum number of elements per tree leaf
    pub tree_max_per_leaf: usize,
    /// Minimum particle count for a node to interact through its cluster
    pub tree_min_for_cluster: usize,

    /// GMRES restart length m
    pub gmres_restart: usize,
    /// GMRES relative residual tolerance
    pub gmres_residual: f64,
    /// GMRES total iteration limit
    pub gmres_num_iter: usize,

    /// Use the block-Jacobi leaf preconditioner
    pub precondition: bool,
    /// Nonpolar-energy flag (parsed and retained; the polar solver ignores it)
    pub nonpolar: bool,

    /// Selected output artifacts
    pub outputs: Vec<OutputKind>,
    /// Prefix of all output files
    pub output_prefix: String,
}

impl Params {
    /// Parse a parameter file
    pub fn from_file(path: &Path) -> Result<Self, BemError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BemError::Config(format!("param file {} is not readable: {e}", path.display()))
        })?;
        Self::from_str_contents(&content)
    }

    /// Parse parameter-file contents
    pub fn from_str_contents(content: &str) -> Result<Self, BemError> {
        let mut pqr_path: Option<PathBuf> = None;

        let mut mesh = MeshKind::Ses;
        let mut mesh_format = MeshFormat::Msms;
        let mut mesh_density = 1.0;
        let mut mesh_probe_radius = 1.4;
        let mut input_mesh_prefix = String::new();

        let mut eps_solute = 1.0;
        let mut eps_solvent = 80.0;
        let mut bulk_strength = 0.15;
        let mut temperature = 298.15;

        let mut tree_degree = 3_usize;
        let mut tree_theta = 0.8;
        let mut tree_max_per_leaf = 500_usize;
        let mut tree_min_for_cluster = 40_usize;

        let mut gmres_restart = 10_usize;
        let mut gmres_residual = 1e-4;
        let mut gmres_num_iter = 1000_usize;

        let mut precondition = false;
        let mut nonpolar = false;

        let mut outputs = Vec::new();
        let mut output_prefix = String::from("output");

        for line in content.lines() {
            let mut tokens = line.split_whitespace();
            let Some(token) = tokens.next() else {
                continue;
            };
            let Some(value) = tokens.next() else {
                return Err(BemError::Config(format!("key `{token}` has no value")));
            };

            let key = token.to_ascii_lowercase();
            let value_lower = value.to_ascii_lowercase();

            match key.as_str() {
                "mol" | "pqr" => {
                    // Path keeps its original case
                    pqr_path = Some(PathBuf::from(value));
                }
                "pdie" => eps_solute = parse_positive(&key, &value_lower)?,
                "sdie" => eps_solvent = parse_positive(&key, &value_lower)?,
                "bulk" => bulk_strength = parse_non_negative(&key, &value_lower)?,
                "temp" => temperature = parse_positive(&key, &value_lower)?,
                "tree_degree" => tree_degree = parse_positive_int(&key, &value_lower)?,
                "tree_theta" => {
                    tree_theta = parse_f64(&key, &value_lower)?;
                    if !(0.0..=1.0).contains(&tree_theta) {
                        return Err(BemError::Config(format!(
                            "invalid tree_theta value: {tree_theta}"
                        )));
                    }
                }
                "tree_max_per_leaf" => {
                    tree_max_per_leaf = parse_positive_int(&key, &value_lower)?
                }
                "tree_min_for_cluster" => {
                    tree_min_for_cluster = parse_positive_int(&key, &value_lower)?
                }
                "gmres_restart" => gmres_restart = parse_positive_int(&key, &value_lower)?,
                "gmres_residual" => {
                    gmres_residual = parse_f64(&key, &value_lower)?;
                    if !(0.0..=1.0).contains(&gmres_residual) {
                        return Err(BemError::Config(format!(
                            "invalid gmres_residual value: {gmres_residual}"
                        )));
                    }
                }
                "gmres_num_iter" => gmres_num_iter = parse_positive_int(&key, &value_lower)?,
                "mesh" => {
                    mesh = match value_lower.as_str() {
                        "ses" => MeshKind::Ses,
                        "skin" => MeshKind::Skin,
                        other => {
                            return Err(BemError::Config(format!("invalid mesh value: {other}")));
                        }
                    }
                }
                "mesh_format" => {
                    mesh_format = match value_lower.as_str() {
                        "msms" => MeshFormat::Msms,
                        "ply" => MeshFormat::Ply,
                        other => {
                            return Err(BemError::Config(format!(
                                "invalid mesh_format value: {other}"
                            )));
                        }
                    }
                }
                "sdens" => mesh_density = parse_non_negative(&key, &value_lower)?,
                "srad" => mesh_probe_radius = parse_non_negative(&key, &value_lower)?,
                "precondition" => {
                    precondition = matches!(value_lower.as_str(), "true" | "on" | "yes" | "1")
                }
                "nonpolar" => nonpolar = value_lower == "true",
                "outdata" => {
                    let kind = match value_lower.as_str() {
                        "vtk" => OutputKind::Vtk,
                        "ply" => OutputKind::Ply,
                        "csv" => OutputKind::Csv,
                        "csv_headers" => OutputKind::CsvHeaders,
                        "timers" => OutputKind::Timers,
                        other => {
                            return Err(BemError::Config(format!(
                                "invalid outdata value: {other}"
                            )));
                        }
                    };
                    if !outputs.contains(&kind) {
                        outputs.push(kind);
                    }
                }
                "output_prefix" => {
                    if !value.is_empty() {
                        output_prefix = value.to_string();
                    }
                }
                "input_mesh_prefix" => {
                    if !value.is_empty() {
                        input_mesh_prefix = value.to_string();
                    }
                }
                other => {
                    log::warn!("Skipping undefined token: {other}");
                }
            }
        }

        let Some(pqr_path) = pqr_path else {
            return Err(BemError::Config("no pqr file given (key `mol` or `pqr`)".into()));
        };

        Ok(Self {
            pqr_path,
            mesh,
            mesh_format,
            mesh_density,
            mesh_probe_radius,
            input_mesh_prefix,
            phys: PhysicsParams::new(eps_solute, eps_solvent, bulk_strength, temperature),
            tree_degree,
            tree_theta,
            tree_max_per_leaf,
            tree_min_for_cluster,
            gmres_restart,
            gmres_residual,
            gmres_num_iter,
            precondition,
            nonpolar,
            outputs,
            output_prefix,
        })
    }

    /// Whether the given output artifact was requested
    pub fn wants_output(&self, kind: OutputKind) -> bool {
        self.outputs.contains(&kind)
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, BemError> {
    value
        .parse::<f64>()
        .map_err(|_| BemError::Config(format!("invalid {key} value: {value}")))
}

fn parse_positive(key: &str, value: &str) -> Result<f64, BemError> {
    let v = parse_f64(key, value)?;
    if v <= 0.0 {
        return Err(BemError::Config(format!("invalid {key} value: {value}")));
    }
    Ok(v)
}

fn parse_non_negative(key: &str, value: &str) -> Result<f64, BemError> {
    let v = parse_f64(key, value)?;
    if v < 0.0 {
        return Err(BemError::Config(format!("invalid {key} value: {value}")));
    }
    Ok(v)
}

fn parse_positive_int(key: &str, value: &str) -> Result<usize, BemError> {
    let v = value
        .parse::<i64>()
        .map_err(|_| BemError::Config(format!("invalid {key} value: {value}")))?;
    if v <= 0 {
        return Err(BemError::Config(format!("invalid {key} value: {value}")));
    }
    Ok(v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EXAMPLE: &str = "\
mol molecule.pqr
pdie 1.0
sdie 80.0
bulk 0.15
temp 298.15
tree_degree 3
tree_theta 0.8
tree_max_per_leaf 500
gmres_restart 10
gmres_residual 1e-4
gmres_num_iter 1000
mesh ses
mesh_format msms
sdens 1.0
srad 1.4
precondition on
outdata csv
outdata vtk
output_prefix born_ion
";

    #[test]
    fn test_parse_full_file() {
        let params = Params::from_str_contents(EXAMPLE).unwrap();

        assert_eq!(params.pqr_path, PathBuf::from("molecule.pqr"));
        assert_eq!(params.tree_degree, 3);
        assert_relative_eq!(params.tree_theta, 0.8);
        assert_eq!(params.tree_max_per_leaf, 500);
        assert_eq!(params.gmres_restart, 10);
        assert!(params.precondition);
        assert_eq!(params.outputs, vec![OutputKind::Csv, OutputKind::Vtk]);
        assert_eq!(params.output_prefix, "born_ion");
        assert_relative_eq!(params.phys.eps, 80.0);
    }

    #[test]
    fn test_case_insensitive_keys() {
        let params =
            Params::from_str_contents("PQR m.pqr\nPDIE 2.0\nMesh SKIN\nPRECONDITION TRUE\n")
                .unwrap();
        assert_eq!(params.mesh, MeshKind::Skin);
        assert!(params.precondition);
        assert_relative_eq!(params.phys.eps_solute, 2.0);
    }

    #[test]
    fn test_unknown_key_skipped() {
        let params = Params::from_str_contents("mol m.pqr\nwibble 42\n").unwrap();
        assert_eq!(params.pqr_path, PathBuf::from("m.pqr"));
    }

    #[test]
    fn test_missing_pqr_rejected() {
        assert!(matches!(
            Params::from_str_contents("pdie 1.0\n").unwrap_err(),
            BemError::Config(_)
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for bad in [
            "mol m.pqr\ntree_theta 1.5\n",
            "mol m.pqr\ntree_degree 0\n",
            "mol m.pqr\ntree_degree -2\n",
            "mol m.pqr\ngmres_residual 2.0\n",
            "mol m.pqr\ngmres_num_iter 0\n",
            "mol m.pqr\nsdens -1.0\n",
            "mol m.pqr\nmesh cube\n",
            "mol m.pqr\noutdata json\n",
        ] {
            assert!(
                matches!(Params::from_str_contents(bad), Err(BemError::Config(_))),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn test_defaults() {
        let params = Params::from_str_contents("mol m.pqr\n").unwrap();
        assert_eq!(params.mesh, MeshKind::Ses);
        assert_eq!(params.mesh_format, MeshFormat::Msms);
        assert_eq!(params.gmres_restart, 10);
        assert_relative_eq!(params.gmres_residual, 1e-4);
        assert_eq!(params.gmres_num_iter, 1000);
        assert_eq!(params.tree_min_for_cluster, 40);
        assert!(!params.precondition);
        assert_eq!(params.output_prefix, "output");
        assert!(params.outputs.is_empty());
    }
}

//! PQR molecule input
//!
//! A PQR file is PDB-like text; every line starting with `ATOM`
//! contributes position, partial charge and radius from whitespace-split
//! fields 6-10. Other record types are ignored.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::error::BemError;

/// Read-only atom table of the solute
#[derive(Debug, Clone)]
pub struct Molecule {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    charge: Vec<f64>,
    radius: Vec<f64>,
}

impl Molecule {
    /// Parse a PQR file
    pub fn from_pqr(path: &Path) -> Result<Self, BemError> {
        let file = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| {
            BemError::Io(std::io::Error::new(
                e.kind(),
                format!("pqr file {file} is not readable: {e}"),
            ))
        })?;

        let mut molecule = Molecule {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            charge: Vec::new(),
            radius: Vec::new(),
        };

        for line in content.lines() {
            if !line.starts_with("ATOM") {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 10 {
                return Err(BemError::Malformed {
                    file: file.clone(),
                    reason: format!("ATOM line has {} fields, expected 10: `{line}`", tokens.len()),
                });
            }

            let mut fields = [0.0_f64; 5];
            for (slot, token) in fields.iter_mut().zip(&tokens[5..10]) {
                *slot = token.parse::<f64>().map_err(|e| BemError::Malformed {
                    file: file.clone(),
                    reason: format!("bad numeric field `{token}`: {e}"),
                })?;
            }

            molecule.x.push(fields[0]);
            molecule.y.push(fields[1]);
            molecule.z.push(fields[2]);
            molecule.charge.push(fields[3]);
            molecule.radius.push(fields[4]);
        }

        if molecule.num_atoms() == 0 {
            return Err(BemError::Malformed {
                file,
                reason: "no ATOM records found".into(),
            });
        }

        log::info!(
            "Read {} atoms, net charge {:+.4}",
            molecule.num_atoms(),
            molecule.net_charge()
        );

        Ok(molecule)
    }

    /// Build a molecule from (position, charge, radius) triples
    pub fn from_atoms(atoms: Vec<([f64; 3], f64, f64)>) -> Self {
        let mut molecule = Molecule {
            x: Vec::with_capacity(atoms.len()),
            y: Vec::with_capacity(atoms.len()),
            z: Vec::with_capacity(atoms.len()),
            charge: Vec::with_capacity(atoms.len()),
            radius: Vec::with_capacity(atoms.len()),
        };
        for (pos, q, r) in atoms {
            molecule.x.push(pos[0]);
            molecule.y.push(pos[1]);
            molecule.z.push(pos[2]);
            molecule.charge.push(q);
            molecule.radius.push(r);
        }
        molecule
    }

    /// Number of atoms
    pub fn num_atoms(&self) -> usize {
        self.x.len()
    }

    /// Position of atom j
    #[inline]
    pub fn position(&self, j: usize) -> [f64; 3] {
        [self.x[j], self.y[j], self.z[j]]
    }

    /// Partial charge of atom j
    #[inline]
    pub fn charge(&self, j: usize) -> f64 {
        self.charge[j]
    }

    /// Radius of atom j
    #[inline]
    pub fn radius(&self, j: usize) -> f64 {
        self.radius[j]
    }

    /// Sum of partial charges
    pub fn net_charge(&self) -> f64 {
        self.charge.iter().sum()
    }

    /// Write the `x y z radius` rows consumed by NanoShaper
    pub fn write_xyzr(&self, path: &Path) -> Result<(), BemError> {
        let mut file = fs::File::create(path)?;
        for j in 0..self.num_atoms() {
            writeln!(file, "{} {} {} {}", self.x[j], self.y[j], self.z[j], self.radius[j])?;
        }
        Ok(())
    }
}

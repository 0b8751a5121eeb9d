//! MSMS mesh reader
//!
//! An MSMS surface is a pair of whitespace-delimited text files sharing a
//! prefix. Both start with two header lines followed by a line whose first
//! integer is the row count. `.vert` rows carry at least six floats
//! (position then normal); `.face` rows carry at least three 1-based vertex
//! indices.

use std::fs;
use std::path::Path;

use crate::core::error::BemError;
use crate::core::mesh::SurfaceMesh;

/// Read `<prefix>.vert` and `<prefix>.face`
pub fn read(prefix: &str) -> Result<SurfaceMesh, BemError> {
    let vert_path = format!("{prefix}.vert");
    let face_path = format!("{prefix}.face");

    let (vertices, normals) = read_vert_file(Path::new(&vert_path))?;
    let faces = read_face_file(Path::new(&face_path), vertices.len())?;

    Ok(SurfaceMesh {
        vertices,
        normals,
        faces,
    })
}

#[allow(clippy::type_complexity)]
fn read_vert_file(path: &Path) -> Result<(Vec<[f64; 3]>, Vec<[f64; 3]>), BemError> {
    let file = path.display().to_string();
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();

    // Two header lines, then the vertex count
    lines.next();
    lines.next();
    let count_line = lines.next().ok_or_else(|| BemError::Malformed {
        file: file.clone(),
        reason: "missing vertex count line".into(),
    })?;
    let num_vertices = parse_leading_count(count_line, &file)?;

    let mut vertices = Vec::with_capacity(num_vertices);
    let mut normals = Vec::with_capacity(num_vertices);

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<f64> = line
            .split_whitespace()
            .take(6)
            .map(|t| t.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| BemError::Malformed {
                file: file.clone(),
                reason: format!("bad vertex row `{line}`: {e}"),
            })?;
        if fields.len() < 6 {
            return Err(BemError::Malformed {
                file: file.clone(),
                reason: format!("vertex row `{line}` has fewer than six fields"),
            });
        }
        vertices.push([fields[0], fields[1], fields[2]]);
        normals.push([fields[3], fields[4], fields[5]]);
    }

    if vertices.len() != num_vertices {
        return Err(BemError::Malformed {
            file,
            reason: format!("expected {} vertices, found {}", num_vertices, vertices.len()),
        });
    }

    Ok((vertices, normals))
}

fn read_face_file(path: &Path, num_vertices: usize) -> Result<Vec<[usize; 3]>, BemError> {
    let file = path.display().to_string();
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();

    lines.next();
    lines.next();
    let count_line = lines.next().ok_or_else(|| BemError::Malformed {
        file: file.clone(),
        reason: "missing face count line".into(),
    })?;
    let num_faces = parse_leading_count(count_line, &file)?;

    let mut faces = Vec::with_capacity(num_faces);

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<usize> = line
            .split_whitespace()
            .take(3)
            .map(|t| t.parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|e| BemError::Malformed {
                file: file.clone(),
                reason: format!("bad face row `{line}`: {e}"),
            })?;
        if fields.len() < 3 {
            return Err(BemError::Malformed {
                file: file.clone(),
                reason: format!("face row `{line}` has fewer than three fields"),
            });
        }
        // MSMS faces are 1-based
        let mut face = [0_usize; 3];
        for (k, &v) in fields.iter().enumerate() {
            if v == 0 || v > num_vertices {
                return Err(BemError::Malformed {
                    file: file.clone(),
                    reason: format!("face row `{line}` references vertex {v}"),
                });
            }
            face[k] = v - 1;
        }
        faces.push(face);
    }

    if faces.len() != num_faces {
        return Err(BemError::Malformed {
            file,
            reason: format!("expected {} faces, found {}", num_faces, faces.len()),
        });
    }

    Ok(faces)
}

fn parse_leading_count(line: &str, file: &str) -> Result<usize, BemError> {
    line.split_whitespace()
        .next()
        .and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| BemError::Malformed {
            file: file.to_string(),
            reason: format!("bad count line `{line}`"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("pb_bem_msms_tests");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_tetrahedron() {
        let vert = "\
# MSMS solvent excluded surface
#faces vertices
4 4 1.0 1.4
 0.0 0.0 0.0  0.577 0.577 0.577 0 1 0
 1.0 0.0 0.0 -0.577 0.577 0.577 0 1 0
 0.0 1.0 0.0  0.577 -0.577 0.577 0 1 0
 0.0 0.0 1.0  0.577 0.577 -0.577 0 1 0
";
        let face = "\
# MSMS solvent excluded surface
#faces
4 4 1.0 1.4
1 2 3 1 1
1 2 4 1 1
1 3 4 1 1
2 3 4 1 1
";
        let dir = std::env::temp_dir().join("pb_bem_msms_tests");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("tet.vert"), vert).unwrap();
        std::fs::write(dir.join("tet.face"), face).unwrap();

        let mesh = read(dir.join("tet").to_str().unwrap()).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.faces[3], [1, 2, 3]);
    }

    #[test]
    fn test_reject_out_of_range_face() {
        write_temp("bad.vert", "h\nh\n1\n0.0 0.0 0.0 0.0 0.0 1.0\n");
        write_temp("bad.face", "h\nh\n1\n1 2 3\n");

        let dir = std::env::temp_dir().join("pb_bem_msms_tests");
        let err = read(dir.join("bad").to_str().unwrap()).unwrap_err();
        assert!(matches!(err, BemError::Malformed { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = read("/nonexistent/prefix").unwrap_err();
        assert!(matches!(err, BemError::Io(_)));
    }
}

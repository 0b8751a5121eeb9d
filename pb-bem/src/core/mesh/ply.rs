//! PLY mesh reader
//!
//! Reads standard PLY surfaces with a `vertex` element carrying
//! x/y/z/nx/ny/nz properties and a `face` element carrying a
//! `vertex_indices` list of three 0-based indices. Both ASCII and
//! binary-little-endian files are supported; extra vertex properties are
//! skipped.

use std::fs;
use std::path::Path;

use crate::core::error::BemError;
use crate::core::mesh::SurfaceMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "char" | "int8" => Some(ScalarType::I8),
            "uchar" | "uint8" => Some(ScalarType::U8),
            "short" | "int16" => Some(ScalarType::I16),
            "ushort" | "uint16" => Some(ScalarType::U16),
            "int" | "int32" => Some(ScalarType::I32),
            "uint" | "uint32" => Some(ScalarType::U32),
            "float" | "float32" => Some(ScalarType::F32),
            "double" | "float64" => Some(ScalarType::F64),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    fn read_f64(self, bytes: &[u8]) -> f64 {
        match self {
            ScalarType::I8 => bytes[0] as i8 as f64,
            ScalarType::U8 => bytes[0] as f64,
            ScalarType::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ScalarType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            ScalarType::I32 => i32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64,
            ScalarType::U32 => u32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64,
            ScalarType::F32 => f32::from_le_bytes(bytes[..4].try_into().unwrap()) as f64,
            ScalarType::F64 => f64::from_le_bytes(bytes[..8].try_into().unwrap()),
        }
    }
}

#[derive(Debug, Clone)]
enum Property {
    Scalar { name: String, ty: ScalarType },
    List { count_ty: ScalarType, item_ty: ScalarType },
}

#[derive(Debug, Clone)]
struct ElementDecl {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ascii,
    BinaryLittleEndian,
}

/// Read a PLY surface
pub fn read(path: &Path) -> Result<SurfaceMesh, BemError> {
    let file = path.display().to_string();
    let data = fs::read(path)?;

    let (format, elements, body_offset) = parse_header(&data, &file)?;

    match format {
        Format::Ascii => read_ascii(&data[body_offset..], &elements, &file),
        Format::BinaryLittleEndian => read_binary(&data[body_offset..], &elements, &file),
    }
}

fn malformed(file: &str, reason: impl Into<String>) -> BemError {
    BemError::Malformed {
        file: file.to_string(),
        reason: reason.into(),
    }
}

fn parse_header(data: &[u8], file: &str) -> Result<(Format, Vec<ElementDecl>, usize), BemError> {
    let mut offset = 0;
    let mut lines = Vec::new();

    // The header is ASCII text terminated by `end_header`; record where the
    // body starts so binary payloads are untouched.
    loop {
        let end = data[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| malformed(file, "unterminated header"))?;
        let line = std::str::from_utf8(&data[offset..offset + end])
            .map_err(|_| malformed(file, "non-UTF8 header"))?
            .trim_end_matches('\r')
            .to_string();
        offset += end + 1;
        let is_end = line.trim() == "end_header";
        lines.push(line);
        if is_end {
            break;
        }
        if offset >= data.len() {
            return Err(malformed(file, "missing end_header"));
        }
    }

    let mut it = lines.iter();
    if it.next().map(|s| s.trim()) != Some("ply") {
        return Err(malformed(file, "missing `ply` magic"));
    }

    let mut format = None;
    let mut elements: Vec<ElementDecl> = Vec::new();

    for line in it {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.first().copied() {
            Some("comment") | Some("obj_info") | None => {}
            Some("format") => {
                format = match tokens.get(1).copied() {
                    Some("ascii") => Some(Format::Ascii),
                    Some("binary_little_endian") => Some(Format::BinaryLittleEndian),
                    Some(other) => {
                        return Err(malformed(file, format!("unsupported format {other}")));
                    }
                    None => return Err(malformed(file, "format line without a value")),
                };
            }
            Some("element") => {
                let name = tokens
                    .get(1)
                    .ok_or_else(|| malformed(file, "element line without a name"))?;
                let count = tokens
                    .get(2)
                    .and_then(|t| t.parse::<usize>().ok())
                    .ok_or_else(|| malformed(file, "element line without a count"))?;
                elements.push(ElementDecl {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| malformed(file, "property before element"))?;
                if tokens.get(1).copied() == Some("list") {
                    let count_ty = tokens
                        .get(2)
                        .and_then(|t| ScalarType::parse(t))
                        .ok_or_else(|| malformed(file, "bad list count type"))?;
                    let item_ty = tokens
                        .get(3)
                        .and_then(|t| ScalarType::parse(t))
                        .ok_or_else(|| malformed(file, "bad list item type"))?;
                    element.properties.push(Property::List { count_ty, item_ty });
                } else {
                    let ty = tokens
                        .get(1)
                        .and_then(|t| ScalarType::parse(t))
                        .ok_or_else(|| malformed(file, "bad property type"))?;
                    let name = tokens
                        .get(2)
                        .ok_or_else(|| malformed(file, "property without a name"))?;
                    element.properties.push(Property::Scalar {
                        name: name.to_string(),
                        ty,
                    });
                }
            }
            Some("end_header") => break,
            Some(other) => {
                return Err(malformed(file, format!("unknown header keyword {other}")));
            }
        }
    }

    let format = format.ok_or_else(|| malformed(file, "missing format line"))?;
    Ok((format, elements, offset))
}

/// Column positions of x,y,z,nx,ny,nz among the vertex scalar properties
fn vertex_columns(decl: &ElementDecl, file: &str) -> Result<[usize; 6], BemError> {
    let mut cols = [usize::MAX; 6];
    for (idx, prop) in decl.properties.iter().enumerate() {
        if let Property::Scalar { name, .. } = prop {
            let slot = match name.as_str() {
                "x" => 0,
                "y" => 1,
                "z" => 2,
                "nx" => 3,
                "ny" => 4,
                "nz" => 5,
                _ => continue,
            };
            cols[slot] = idx;
        }
    }
    if cols.iter().any(|&c| c == usize::MAX) {
        return Err(malformed(file, "vertex element lacks x/y/z/nx/ny/nz"));
    }
    Ok(cols)
}

fn build_mesh(
    vertices: Vec<[f64; 3]>,
    normals: Vec<[f64; 3]>,
    faces: Vec<[usize; 3]>,
) -> SurfaceMesh {
    SurfaceMesh {
        vertices,
        normals,
        faces,
    }
}

fn read_ascii(
    body: &[u8],
    elements: &[ElementDecl],
    file: &str,
) -> Result<SurfaceMesh, BemError> {
    let text = std::str::from_utf8(body).map_err(|_| malformed(file, "non-UTF8 ascii body"))?;
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut faces = Vec::new();

    for decl in elements {
        match decl.name.as_str() {
            "vertex" => {
                let cols = vertex_columns(decl, file)?;
                vertices.reserve(decl.count);
                normals.reserve(decl.count);
                for _ in 0..decl.count {
                    let line = lines
                        .next()
                        .ok_or_else(|| malformed(file, "truncated vertex data"))?;
                    let fields: Vec<f64> = line
                        .split_whitespace()
                        .map(|t| t.parse::<f64>())
                        .collect::<Result<_, _>>()
                        .map_err(|e| malformed(file, format!("bad vertex row: {e}")))?;
                    if fields.len() < decl.properties.len() {
                        return Err(malformed(file, "short vertex row"));
                    }
                    vertices.push([fields[cols[0]], fields[cols[1]], fields[cols[2]]]);
                    normals.push([fields[cols[3]], fields[cols[4]], fields[cols[5]]]);
                }
            }
            "face" => {
                faces.reserve(decl.count);
                for _ in 0..decl.count {
                    let line = lines
                        .next()
                        .ok_or_else(|| malformed(file, "truncated face data"))?;
                    let fields: Vec<usize> = line
                        .split_whitespace()
                        .map(|t| t.parse::<usize>())
                        .collect::<Result<_, _>>()
                        .map_err(|e| malformed(file, format!("bad face row: {e}")))?;
                    if fields.first().copied() != Some(3) || fields.len() < 4 {
                        return Err(malformed(file, "only triangular faces are supported"));
                    }
                    faces.push([fields[1], fields[2], fields[3]]);
                }
            }
            _ => {
                // Skip rows of unknown elements
                for _ in 0..decl.count {
                    lines.next();
                }
            }
        }
    }

    Ok(build_mesh(vertices, normals, faces))
}

fn take<'a>(
    body: &'a [u8],
    offset: &mut usize,
    n: usize,
    file: &str,
) -> Result<&'a [u8], BemError> {
    if *offset + n > body.len() {
        return Err(malformed(file, "truncated binary data"));
    }
    let slice = &body[*offset..*offset + n];
    *offset += n;
    Ok(slice)
}

fn read_binary(
    body: &[u8],
    elements: &[ElementDecl],
    file: &str,
) -> Result<SurfaceMesh, BemError> {
    let mut offset = 0;

    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut faces = Vec::new();

    for decl in elements {
        match decl.name.as_str() {
            "vertex" => {
                let cols = vertex_columns(decl, file)?;
                vertices.reserve(decl.count);
                normals.reserve(decl.count);
                for _ in 0..decl.count {
                    let mut fields = vec![0.0_f64; decl.properties.len()];
                    for (idx, prop) in decl.properties.iter().enumerate() {
                        match prop {
                            Property::Scalar { ty, .. } => {
                                let bytes = take(body, &mut offset, ty.size(), file)?;
                                fields[idx] = ty.read_f64(bytes);
                            }
                            Property::List { .. } => {
                                return Err(malformed(file, "list property on vertex"));
                            }
                        }
                    }
                    vertices.push([fields[cols[0]], fields[cols[1]], fields[cols[2]]]);
                    normals.push([fields[cols[3]], fields[cols[4]], fields[cols[5]]]);
                }
            }
            "face" => {
                faces.reserve(decl.count);
                for _ in 0..decl.count {
                    for prop in &decl.properties {
                        match prop {
                            Property::List { count_ty, item_ty } => {
                                let bytes = take(body, &mut offset, count_ty.size(), file)?;
                                let count = count_ty.read_f64(bytes) as usize;
                                if count != 3 {
                                    return Err(malformed(
                                        file,
                                        "only triangular faces are supported",
                                    ));
                                }
                                let mut face = [0_usize; 3];
                                for slot in face.iter_mut() {
                                    let bytes = take(body, &mut offset, item_ty.size(), file)?;
                                    *slot = item_ty.read_f64(bytes) as usize;
                                }
                                faces.push(face);
                            }
                            Property::Scalar { ty, .. } => {
                                take(body, &mut offset, ty.size(), file)?;
                            }
                        }
                    }
                }
            }
            _ => {
                // Unknown binary elements cannot be skipped without scalar-only rows
                let row_size: Option<usize> = decl
                    .properties
                    .iter()
                    .map(|p| match p {
                        Property::Scalar { ty, .. } => Some(ty.size()),
                        Property::List { .. } => None,
                    })
                    .sum();
                match row_size {
                    Some(size) => {
                        take(body, &mut offset, size * decl.count, file)?;
                    }
                    None => {
                        return Err(malformed(
                            file,
                            format!("cannot skip list element `{}`", decl.name),
                        ));
                    }
                }
            }
        }
    }

    Ok(build_mesh(vertices, normals, faces))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_PLY: &str = "\
ply
format ascii 1.0
comment test tetrahedron
element vertex 4
property float x
property float y
property float z
property float nx
property float ny
property float nz
element face 4
property list uchar uint vertex_indices
end_header
0 0 0 0.577 0.577 0.577
1 0 0 -0.577 0.577 0.577
0 1 0 0.577 -0.577 0.577
0 0 1 0.577 0.577 -0.577
3 0 1 2
3 0 1 3
3 0 2 3
3 1 2 3
";

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("pb_bem_ply_tests");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_read_ascii() {
        let path = temp_path("tet.ply");
        std::fs::write(&path, ASCII_PLY).unwrap();

        let mesh = read(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.vertices[1], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_read_binary_little_endian() {
        let mut data = Vec::new();
        data.extend_from_slice(
            b"ply\nformat binary_little_endian 1.0\nelement vertex 3\n\
property float x\nproperty float y\nproperty float z\n\
property float nx\nproperty float ny\nproperty float nz\n\
element face 1\nproperty list uchar uint vertex_indices\nend_header\n",
        );
        for v in [
            [0.0_f32, 0.0, 0.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        ] {
            for x in v {
                data.extend_from_slice(&x.to_le_bytes());
            }
        }
        data.push(3_u8);
        for idx in [0_u32, 1, 2] {
            data.extend_from_slice(&idx.to_le_bytes());
        }

        let path = temp_path("tri_bin.ply");
        std::fs::write(&path, &data).unwrap();

        let mesh = read(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.faces[0], [0, 1, 2]);
        assert_eq!(mesh.normals[2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_reject_quad_faces() {
        let quad = ASCII_PLY.replace("3 0 1 2", "4 0 1 2 3");
        let path = temp_path("quad.ply");
        std::fs::write(&path, quad).unwrap();

        assert!(matches!(
            read(&path).unwrap_err(),
            BemError::Malformed { .. }
        ));
    }

    #[test]
    fn test_reject_missing_normals() {
        let no_normals = "\
ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
element face 0
property list uchar uint vertex_indices
end_header
0 0 0
";
        let path = temp_path("nonorm.ply");
        std::fs::write(&path, no_normals).unwrap();

        assert!(matches!(
            read(&path).unwrap_err(),
            BemError::Malformed { .. }
        ));
    }
}

// Wavefront-style geometry file reader.
//
// Only two records are consumed:
//   v <x> <y> <z>                 vertex position (extra components are ignored)
//   f <p>/<t>/<n> <p>/<t>/<n> ... triangle, position index only
// Every other tag (vn, vt, g, o, s, #, usemtl, ...) is skipped.
//
// Policy is fail-fast: a malformed number on a v/f line aborts the load.
// Face indices are 1-based in the file and validated against the final vertex
// count once the whole file has been read.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::Vec3;

use super::error::{MeshError, MeshResult};

/// Positions plus 0-based triangle indices, straight out of the file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ObjData {
    pub positions: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
}

// A face as written in the file, before index validation.
struct RawFace {
    line: usize,
    corners: [i64; 3],
}

/// Read and parse a geometry file from disk.
pub fn parse(path: &Path) -> MeshResult<ObjData> {
    let file = File::open(path).map_err(|source| MeshError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(BufReader::new(file), path)
}

/// Parse geometry from any buffered reader. `path` is only used in error messages.
pub fn parse_reader<R: BufRead>(reader: R, path: &Path) -> MeshResult<ObjData> {
    let mut positions = Vec::new();
    let mut raw_faces = Vec::new();
    let mut skipped = 0usize;

    // Raw byte lines: exporters put Latin-1 and the like into comments and
    // names, which must not fail the load. Invalid bytes inside a v/f record
    // still surface as a parse error on that line.
    for (i, line) in reader.split(b'\n').enumerate() {
        let line_no = i + 1;
        let bytes = line.map_err(|source| MeshError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let line = String::from_utf8_lossy(&bytes);

        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => positions.push(parse_vertex(tokens, path, line_no)?),
            Some("f") => raw_faces.push(parse_face(tokens, path, line_no)?),
            Some(_) => skipped += 1,
            None => {}
        }
    }

    if skipped > 0 {
        log::debug!("{}: ignored {} unrecognised records", path.display(), skipped);
    }

    let vertex_count = positions.len();
    let faces = raw_faces
        .iter()
        .map(|face| resolve_face(face, vertex_count, path))
        .collect::<MeshResult<Vec<_>>>()?;

    Ok(ObjData { positions, faces })
}

fn parse_vertex<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    path: &Path,
    line: usize,
) -> MeshResult<Vec3> {
    let mut xyz = [0.0f32; 3];
    for (axis, slot) in ["x", "y", "z"].iter().zip(xyz.iter_mut()) {
        let token = tokens.next().ok_or_else(|| MeshError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("vertex is missing its {} coordinate", axis),
        })?;
        let value: f32 = token.parse().map_err(|_| MeshError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("invalid {} coordinate '{}'", axis, token),
        })?;
        // f32 parsing accepts "nan" and "inf", which would poison every normal they touch
        if !value.is_finite() {
            return Err(MeshError::Parse {
                path: path.to_path_buf(),
                line,
                reason: format!("non-finite {} coordinate '{}'", axis, token),
            });
        }
        *slot = value;
    }
    Ok(Vec3::from_array(xyz))
}

fn parse_face<'a>(
    tokens: impl Iterator<Item = &'a str>,
    path: &Path,
    line: usize,
) -> MeshResult<RawFace> {
    let groups: Vec<&str> = tokens.collect();
    if groups.len() != 3 {
        return Err(MeshError::UnsupportedFace {
            path: path.to_path_buf(),
            line,
            corners: groups.len(),
        });
    }

    let mut corners = [0i64; 3];
    for (group, slot) in groups.iter().zip(corners.iter_mut()) {
        // position/texture/normal: only the position index matters here
        let position = group.split('/').next().unwrap_or("");
        *slot = position.parse().map_err(|_| MeshError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("invalid face corner '{}'", group),
        })?;
    }
    Ok(RawFace { line, corners })
}

fn resolve_face(face: &RawFace, vertex_count: usize, path: &Path) -> MeshResult<[u32; 3]> {
    let mut out = [0u32; 3];
    for (&index, slot) in face.corners.iter().zip(out.iter_mut()) {
        *slot = to_zero_based(index, vertex_count).ok_or_else(|| MeshError::IndexOutOfRange {
            path: path.to_path_buf(),
            line: face.line,
            index,
            vertex_count,
        })?;
    }
    Ok(out)
}

/// Map a 1-based file index onto the vertex list. 0, negatives and anything past
/// the end are rejected rather than wrapped.
pub fn to_zero_based(index: i64, vertex_count: usize) -> Option<u32> {
    if index < 1 || index as u64 > vertex_count as u64 {
        return None;
    }
    u32::try_from(index - 1).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn parse_str(src: &str) -> MeshResult<ObjData> {
        parse_reader(Cursor::new(src), Path::new("test.obj"))
    }

    #[test]
    fn reads_vertices_and_faces() {
        let data = parse_str(
            "# a comment\n\
             o triangle\n\
             v 0 0 0\n\
             v 1.5 0 0\n\
             v 0 -2 0.25\n\
             vn 0 0 1\n\
             vt 0 0\n\
             f 1/1/1 2/1/1 3/1/1\n",
        )
        .unwrap();

        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.positions[1], Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(data.positions[2], Vec3::new(0.0, -2.0, 0.25));
        assert_eq!(data.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn accepts_corners_without_texture_or_normal() {
        let data = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2//1 3/4\n").unwrap();
        assert_eq!(data.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn faces_may_precede_vertices() {
        let data = parse_str("f 3/1/1 2/1/1 1/1/1\nv 0 0 0\nv 1 0 0\nv 0 1 0\n").unwrap();
        assert_eq!(data.faces, vec![[2, 1, 0]]);
    }

    #[test]
    fn index_conversion_bounds() {
        assert_eq!(to_zero_based(1, 4), Some(0));
        assert_eq!(to_zero_based(4, 4), Some(3));
        assert_eq!(to_zero_based(0, 4), None);
        assert_eq!(to_zero_based(5, 4), None);
        assert_eq!(to_zero_based(-1, 4), None);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2/1/1 4/1/1\n").unwrap_err();
        match err {
            MeshError::IndexOutOfRange { line, index, vertex_count, .. } => {
                assert_eq!(line, 4);
                assert_eq!(index, 4);
                assert_eq!(vertex_count, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0/1/1 2/1/1 3/1/1\n").unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { index: 0, .. }));
    }

    #[test]
    fn rejects_quads() {
        let err = parse_str("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFace { line: 5, corners: 4, .. }));
    }

    #[test]
    fn malformed_numbers_fail_fast() {
        let err = parse_str("v 0 0 0\nv 1 abc 0\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 2, .. }));

        let err = parse_str("v 0 0\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 1, .. }));

        let err = parse_str("v 0 0 0\nf x/1/1 1/1/1 1/1/1\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 2, .. }));
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let err = parse_str("v nan 0 0\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 1, .. }));
        assert!(err.to_string().contains("non-finite x"), "{err}");

        let err = parse_str("v 0 0 0\nv 0 inf 0\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 2, .. }));

        let err = parse_str("v 0 0 -infinity\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 1, .. }));
    }

    #[test]
    fn ignores_non_utf8_comment_lines() {
        // Latin-1 "créé" as written by some exporters
        let src: &[u8] = b"# cr\xe9\xe9 par 3ds Max\r\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/1/1 2/1/1 3/1/1\n";
        let data = parse_reader(Cursor::new(src), Path::new("latin1.obj")).unwrap();
        assert_eq!(data.positions.len(), 3);
        assert_eq!(data.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn non_utf8_inside_a_record_is_a_parse_error() {
        let src: &[u8] = b"v 0 0 0\nv 1\xe9 0 0\n";
        let err = parse_reader(Cursor::new(src), Path::new("latin1.obj")).unwrap_err();
        assert!(matches!(err, MeshError::Parse { line: 2, .. }));
    }

    #[test]
    fn tags_must_match_exactly() {
        // "vn"/"vt"/"vp" share a prefix with "v" but are different records
        let data = parse_str("vn 1 0 0\nvp 0.5\nv 1 2 3\n").unwrap();
        assert_eq!(data.positions, vec![Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse(&dir.path().join("missing.obj")).unwrap_err();
        assert!(matches!(err, MeshError::Io { .. }));
        assert!(err.to_string().contains("missing.obj"));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1").unwrap();
        writeln!(file, "f 1/1/1 3/1/1 2/1/1\nf 1/1/1 2/1/1 4/1/1").unwrap();

        let data = parse(file.path()).unwrap();
        assert_eq!(data.positions.len(), 4);
        assert_eq!(data.faces, vec![[0, 2, 1], [0, 1, 3]]);
    }
}

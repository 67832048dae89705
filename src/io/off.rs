//! OFF (Object File Format) support.
//!
//! The format is line oriented:
//!
//! ```text
//! OFF
//! # comments run to the end of the line
//! V F E
//! x y z           (V lines)
//! n i0 i1 ... in  (F lines, optionally followed by colour values)
//! ```
//!
//! The `OFF` keyword may be omitted or share its line with the counts. Extra
//! values after the coordinates or after a face's indices are ignored, which
//! covers the common colour and normal extensions. The edge count in the
//! header is informational; a mismatch is logged and otherwise ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{info, warn};
use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OFF file.
///
/// On failure nothing is returned, so a caller's existing mesh is never
/// partially overwritten.
///
/// # Example
///
/// ```no_run
/// use edgefold::io::off;
/// use edgefold::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = off::load("model.off").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mesh = read_off(BufReader::new(file))?;
    info!(
        "Loaded {}: {} vertices, {} faces, {} edges",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces(),
        mesh.num_edges()
    );
    Ok(mesh)
}

/// Save a mesh to an OFF file.
///
/// # Example
///
/// ```no_run
/// use edgefold::io::off;
/// use edgefold::mesh::{primitives, HalfEdgeMesh};
///
/// let mesh: HalfEdgeMesh = primitives::unit_cube().unwrap();
/// off::save(&mesh, "cube.off").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_off(mesh, &mut writer)?;
    writer.flush()?;
    info!(
        "Saved {}: {} vertices, {} faces",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(())
}

/// Non-empty, comment-stripped lines with their 1-based line numbers.
struct ContentLines<R> {
    inner: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> ContentLines<R> {
    fn new(reader: R) -> Self {
        Self {
            inner: reader.lines(),
            line_no: 0,
        }
    }

    fn next_content(&mut self) -> Result<Option<(usize, String)>> {
        for line in self.inner.by_ref() {
            let line = line?;
            self.line_no += 1;
            let content = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line.as_str(),
            }
            .trim();
            if !content.is_empty() {
                return Ok(Some((self.line_no, content.to_string())));
            }
        }
        Ok(None)
    }

    /// Like [`next_content`](Self::next_content), but running out of input is
    /// a format error reported at the last line read.
    fn expect_content(&mut self, what: &str) -> Result<(usize, String)> {
        self.next_content()?.ok_or_else(|| {
            MeshError::malformed(self.line_no.max(1), format!("unexpected end of file, expected {}", what))
        })
    }
}

fn parse_count(token: &str, line: usize, what: &str) -> Result<usize> {
    token
        .parse::<usize>()
        .map_err(|_| MeshError::malformed(line, format!("invalid {} count '{}'", what, token)))
}

fn is_keyword(token: &str) -> bool {
    token.ends_with("OFF") && token.chars().all(|c| c.is_ascii_uppercase())
}

/// Parse an OFF mesh from a reader.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use edgefold::io::off::read_off;
/// use edgefold::mesh::HalfEdgeMesh;
///
/// let text = "OFF\n3 1 3\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n";
/// let mesh: HalfEdgeMesh = read_off(Cursor::new(text)).unwrap();
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn read_off<R: BufRead, I: MeshIndex>(reader: R) -> Result<HalfEdgeMesh<I>> {
    let mut lines = ContentLines::new(reader);

    let (mut line, first) = lines.expect_content("OFF header")?;
    let mut tokens: Vec<String> = first.split_whitespace().map(str::to_string).collect();
    if tokens.first().is_some_and(|t| is_keyword(t)) {
        tokens.remove(0);
        if tokens.is_empty() {
            let (counts_line, counts) = lines.expect_content("vertex, face and edge counts")?;
            line = counts_line;
            tokens = counts.split_whitespace().map(str::to_string).collect();
        }
    }

    if tokens.len() < 3 {
        return Err(MeshError::malformed(
            line,
            "expected vertex, face and edge counts",
        ));
    }
    let num_vertices = parse_count(&tokens[0], line, "vertex")?;
    let num_faces = parse_count(&tokens[1], line, "face")?;
    let num_edges = parse_count(&tokens[2], line, "edge")?;

    // Counts come from the file; cap the up-front allocation.
    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(num_vertices.min(1 << 20));
    for i in 0..num_vertices {
        let (line, content) = lines.expect_content(&format!(
            "vertex {} of {}",
            i + 1,
            num_vertices
        ))?;
        let mut coords = [0.0f64; 3];
        let mut tokens = content.split_whitespace();
        for c in coords.iter_mut() {
            let token = tokens
                .next()
                .ok_or_else(|| MeshError::malformed(line, "expected 3 vertex coordinates"))?;
            *c = token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MeshError::malformed(line, format!("invalid coordinate '{}'", token)))?;
        }
        vertices.push(Point3::new(coords[0], coords[1], coords[2]));
    }

    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(num_faces.min(1 << 20));
    for i in 0..num_faces {
        let (line, content) = lines.expect_content(&format!("face {} of {}", i + 1, num_faces))?;
        let mut tokens = content.split_whitespace();
        let degree = tokens
            .next()
            .map(|t| parse_count(t, line, "face vertex"))
            .transpose()?
            .unwrap_or(0);
        let indices = tokens
            .take(degree)
            .map(|t| {
                t.parse::<usize>()
                    .map_err(|_| MeshError::malformed(line, format!("invalid vertex index '{}'", t)))
            })
            .collect::<Result<Vec<usize>>>()?;
        if indices.len() != degree {
            return Err(MeshError::malformed(
                line,
                format!("face declares {} vertices but lists {}", degree, indices.len()),
            ));
        }
        faces.push(indices);
    }

    if let Some((line, _)) = lines.next_content()? {
        return Err(MeshError::malformed(
            line,
            format!(
                "unexpected data after {} vertices and {} faces",
                num_vertices, num_faces
            ),
        ));
    }

    let mesh: HalfEdgeMesh<I> = build_from_polygons(&vertices, &faces)?;

    if num_edges != 0 && num_edges != mesh.num_edges() {
        warn!(
            "OFF header declares {} edges but the mesh has {}",
            num_edges,
            mesh.num_edges()
        );
    }

    Ok(mesh)
}

/// Write a mesh as OFF text.
///
/// Vertices are written in live iteration order and renumbered densely, so a
/// mesh with tombstones is written as if it had been compacted.
pub fn write_off<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, mut writer: W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "OFF")?;
    writeln!(writer, "{} {} {}", vertices.len(), faces.len(), mesh.num_edges())?;

    for p in &vertices {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }

    for face in &faces {
        write!(writer, "{}", face.len())?;
        for idx in face {
            write!(writer, " {}", idx)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use std::io::Cursor;

    const CUBE_QUADS: &str = "\
OFF
# unit cube, one quad per side
8 6 12
0 0 0
1 0 0
1 1 0
0 1 0
0 0 1
1 0 1
1 1 1
0 1 1
4 0 3 2 1
4 4 5 6 7
4 0 1 5 4
4 3 7 6 2
4 0 4 7 3
4 1 2 6 5
";

    fn to_text(mesh: &HalfEdgeMesh) -> String {
        let mut buf = Vec::new();
        write_off(mesh, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_read_quads() {
        let mesh: HalfEdgeMesh = read_off(Cursor::new(CUBE_QUADS)).unwrap();
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.num_edges(), 12);
        assert!(mesh.stats().euler_characteristic_ok);
    }

    #[test]
    fn test_roundtrip() {
        let mesh: HalfEdgeMesh = primitives::uv_sphere(5, 7, 1.3).unwrap();
        let text = to_text(&mesh);
        let back: HalfEdgeMesh = read_off(Cursor::new(text.as_bytes())).unwrap();

        assert_eq!(back.num_vertices(), mesh.num_vertices());
        assert_eq!(back.num_faces(), mesh.num_faces());
        assert_eq!(back.num_edges(), mesh.num_edges());
        for ((_, a), (_, b)) in mesh.vertices().zip(back.vertices()) {
            assert!((a.position - b.position).norm() < 1e-12);
        }
        assert_eq!(to_text(&back), text);
    }

    #[test]
    fn test_header_variants() {
        let inline = "OFF 3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n";
        let mesh: HalfEdgeMesh = read_off(Cursor::new(inline)).unwrap();
        assert_eq!(mesh.num_faces(), 1);

        let headerless = "3 1 3\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n";
        let mesh: HalfEdgeMesh = read_off(Cursor::new(headerless)).unwrap();
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_colours_and_comments_are_ignored() {
        let text = "OFF\n\n3 1 3 # counts\n0 0 0\n1 0 0 # second\n0 1 0\n3 0 1 2 255 0 0\n\n# trailing comment\n";
        let mesh: HalfEdgeMesh = read_off(Cursor::new(text)).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_truncated_file() {
        let text = "OFF\n4 2 5\n0 0 0\n1 0 0\n0 1 0\n";
        let err = read_off::<_, u32>(Cursor::new(text)).unwrap_err();
        match err {
            MeshError::Malformed { line, ref message } => {
                assert_eq!(line, 5);
                assert!(message.contains("end of file"));
                assert!(message.contains("vertex 4 of 4"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // A missing face line is reported at the last vertex line.
        let text = "OFF\n3 1 3\n0 0 0\n1 0 0\n0 1 0\n";
        let err = read_off::<_, u32>(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, MeshError::Malformed { line: 5, .. }));
    }

    #[test]
    fn test_extra_data() {
        let text = "OFF\n3 1 3\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n3 0 2 1\n";
        let err = read_off::<_, u32>(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, MeshError::Malformed { line: 7, .. }));
    }

    #[test]
    fn test_bad_numbers() {
        let text = "OFF\n3 1 3\n0 0 zero\n1 0 0\n0 1 0\n3 0 1 2\n";
        assert!(matches!(
            read_off::<_, u32>(Cursor::new(text)),
            Err(MeshError::Malformed { line: 3, .. })
        ));

        let text = "OFF\n3 1 3\n0 0 0\n1 0 0\n0 1 0\n4 0 1 2\n";
        assert!(matches!(
            read_off::<_, u32>(Cursor::new(text)),
            Err(MeshError::Malformed { line: 6, .. })
        ));

        let text = "OFF\nthree 1 3\n";
        assert!(matches!(
            read_off::<_, u32>(Cursor::new(text)),
            Err(MeshError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_connectivity() {
        let text = "OFF\n3 1 3\n0 0 0\n1 0 0\n0 1 0\n3 0 1 7\n";
        assert!(matches!(
            read_off::<_, u32>(Cursor::new(text)),
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 7 })
        ));

        // Three triangles on edge (0, 1).
        let text = "OFF\n5 3 0\n0 0 0\n1 0 0\n0 1 0\n0 -1 0\n0 0 1\n3 0 1 2\n3 1 0 3\n3 0 1 4\n";
        assert!(matches!(
            read_off::<_, u32>(Cursor::new(text)),
            Err(MeshError::NonManifoldEdge { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            read_off::<_, u32>(Cursor::new("")),
            Err(MeshError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            read_off::<_, u32>(Cursor::new("OFF\n0 0 0\n")),
            Err(MeshError::EmptyMesh)
        ));
    }

    #[test]
    fn test_missing_file() {
        let result: Result<HalfEdgeMesh> = load("/nonexistent/dir/mesh.off");
        assert!(matches!(result, Err(MeshError::Io(_))));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let mesh: HalfEdgeMesh = primitives::tetrahedron().unwrap();
        let result = save(&mesh, "/nonexistent/dir/out.off");
        assert!(matches!(result, Err(MeshError::Io(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let mesh: HalfEdgeMesh = primitives::octahedron().unwrap();
        let path = std::env::temp_dir().join(format!("edgefold-off-{}.off", std::process::id()));
        save(&mesh, &path).unwrap();
        let back: HalfEdgeMesh = load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.stats().edge_count, 12);
    }
}

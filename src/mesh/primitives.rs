//! Reference shapes.
//!
//! Small closed and open meshes with known element counts, used by tests,
//! benchmarks, and the `edgefold` binary's demo mode.

use std::f64::consts::PI;

use nalgebra::Point3;

use super::builder::{build_from_polygons, build_from_triangles};
use super::halfedge::HalfEdgeMesh;
use super::index::MeshIndex;
use crate::error::{MeshError, Result};

/// Axis-aligned unit cube `[0, 1]^3`, two triangles per side.
///
/// 8 vertices, 12 faces, 18 edges.
pub fn unit_cube<I: MeshIndex>() -> Result<HalfEdgeMesh<I>> {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    build_from_triangles(&vertices, &faces)
}

/// Corner tetrahedron spanned by the origin and the three unit axes.
pub fn tetrahedron<I: MeshIndex>() -> Result<HalfEdgeMesh<I>> {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ];
    let faces = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
    build_from_triangles(&vertices, &faces)
}

/// Regular octahedron with vertices on the unit axes.
pub fn octahedron<I: MeshIndex>() -> Result<HalfEdgeMesh<I>> {
    let vertices = vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let faces = vec![
        [0, 2, 4],
        [2, 1, 4],
        [1, 3, 4],
        [3, 0, 4],
        [2, 0, 5],
        [1, 2, 5],
        [3, 1, 5],
        [0, 3, 5],
    ];
    build_from_triangles(&vertices, &faces)
}

fn grid_vertices(nx: usize, ny: usize, cell: f64) -> Result<Vec<Point3<f64>>> {
    if nx == 0 || ny == 0 {
        return Err(MeshError::invalid_param(
            "grid resolution",
            format!("{}x{}", nx, ny),
            "must be at least 1x1",
        ));
    }
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3::new(i as f64 * cell, j as f64 * cell, 0.0));
        }
    }
    Ok(vertices)
}

/// Flat open grid of `nx * ny` cells in the XY plane, each split into two
/// triangles. Normals point along +Z.
pub fn triangle_grid<I: MeshIndex>(nx: usize, ny: usize, cell: f64) -> Result<HalfEdgeMesh<I>> {
    let vertices = grid_vertices(nx, ny, cell)?;
    let idx = |i: usize, j: usize| j * (nx + 1) + i;

    let mut faces = Vec::with_capacity(nx * ny * 2);
    for j in 0..ny {
        for i in 0..nx {
            let (v00, v10, v11, v01) = (idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1));
            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }
    build_from_triangles(&vertices, &faces)
}

/// Flat open grid of `nx * ny` quads in the XY plane.
pub fn quad_grid<I: MeshIndex>(nx: usize, ny: usize, cell: f64) -> Result<HalfEdgeMesh<I>> {
    let vertices = grid_vertices(nx, ny, cell)?;
    let idx = |i: usize, j: usize| j * (nx + 1) + i;

    let mut faces = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            faces.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }
    build_from_polygons(&vertices, &faces)
}

/// Closed latitude/longitude sphere centred at the origin.
///
/// Has `2 + (rings - 1) * segments` vertices and `2 * segments * (rings - 1)`
/// triangles. Requires `rings >= 2` and `segments >= 3`.
pub fn uv_sphere<I: MeshIndex>(rings: usize, segments: usize, radius: f64) -> Result<HalfEdgeMesh<I>> {
    if rings < 2 {
        return Err(MeshError::invalid_param("rings", rings, "must be at least 2"));
    }
    if segments < 3 {
        return Err(MeshError::invalid_param("segments", segments, "must be at least 3"));
    }

    let mut vertices = Vec::with_capacity(2 + (rings - 1) * segments);
    vertices.push(Point3::new(0.0, 0.0, radius));
    for r in 1..rings {
        let theta = PI * r as f64 / rings as f64;
        for s in 0..segments {
            let phi = 2.0 * PI * s as f64 / segments as f64;
            vertices.push(Point3::new(
                radius * theta.sin() * phi.cos(),
                radius * theta.sin() * phi.sin(),
                radius * theta.cos(),
            ));
        }
    }
    let south = vertices.len();
    vertices.push(Point3::new(0.0, 0.0, -radius));

    let ring_vertex = |r: usize, s: usize| 1 + (r - 1) * segments + s % segments;

    let mut faces = Vec::with_capacity(2 * segments * (rings - 1));
    for s in 0..segments {
        faces.push([0, ring_vertex(1, s), ring_vertex(1, s + 1)]);
    }
    for r in 1..rings - 1 {
        for s in 0..segments {
            let a = ring_vertex(r, s);
            let b = ring_vertex(r + 1, s);
            let c = ring_vertex(r + 1, s + 1);
            let d = ring_vertex(r, s + 1);
            faces.push([a, b, c]);
            faces.push([a, c, d]);
        }
    }
    for s in 0..segments {
        faces.push([ring_vertex(rings - 1, s), south, ring_vertex(rings - 1, s + 1)]);
    }

    build_from_triangles(&vertices, &faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euler<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> i64 {
        mesh.num_vertices() as i64 - mesh.num_edges() as i64 + mesh.num_faces() as i64
    }

    #[test]
    fn test_closed_shapes() {
        let cube: HalfEdgeMesh = unit_cube().unwrap();
        assert_eq!(
            (cube.num_vertices(), cube.num_faces(), cube.num_edges()),
            (8, 12, 18)
        );

        let tet: HalfEdgeMesh = tetrahedron().unwrap();
        assert_eq!((tet.num_vertices(), tet.num_faces(), tet.num_edges()), (4, 4, 6));

        let oct: HalfEdgeMesh = octahedron().unwrap();
        assert_eq!((oct.num_vertices(), oct.num_faces(), oct.num_edges()), (6, 8, 12));

        for mesh in [&cube, &tet, &oct] {
            assert!(mesh.is_valid());
            assert_eq!(euler(mesh), 2);
            // Outward orientation: every normal points away from the centroid.
            let n = mesh.num_vertices() as f64;
            let center = mesh
                .vertices()
                .fold(nalgebra::Vector3::zeros(), |acc, (_, v)| acc + v.position.coords)
                / n;
            for f in mesh.face_ids() {
                let c = mesh.face_centroid(f).coords - center;
                assert!(mesh.face_normal(f).dot(&c) > 0.0);
            }
        }
    }

    #[test]
    fn test_sphere_counts() {
        let sphere: HalfEdgeMesh = uv_sphere(8, 12, 1.0).unwrap();
        assert_eq!(sphere.num_vertices(), 2 + 7 * 12);
        assert_eq!(sphere.num_faces(), 2 * 12 * 7);
        assert_eq!(euler(&sphere), 2);
        assert!(sphere.is_valid());
        for (_, v) in sphere.vertices() {
            assert!((v.position.coords.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_grids() {
        let tri: HalfEdgeMesh = triangle_grid(3, 2, 1.0).unwrap();
        assert_eq!(tri.num_vertices(), 12);
        assert_eq!(tri.num_faces(), 12);
        assert_eq!(euler(&tri), 1);

        let quad: HalfEdgeMesh = quad_grid(3, 2, 1.0).unwrap();
        assert_eq!(quad.num_faces(), 6);
        assert_eq!(euler(&quad), 1);

        assert!(triangle_grid::<u32>(0, 2, 1.0).is_err());
        assert!(uv_sphere::<u32>(1, 8, 1.0).is_err());
    }
}

//! Factory functions for creating test data.
//!
//! Provides persisted meshes and scene objects used by tests, the harness and
//! the demo binary.

use shared::*;

/// Face of `cube_mesh` facing +Z
pub const CUBE_FRONT_FACE: u32 = 1;
/// Face of `cube_mesh` facing -Z
pub const CUBE_BACK_FACE: u32 = 0;

// ── Meshes ──────────────────────────────────────────────────────

/// Closed cube with edge length `size`, centered at the origin, faces wound
/// outward. Face order: -Z, +Z, -Y, +Y, -X, +X.
pub fn cube_mesh(size: f32) -> PersistedMesh {
    let h = size * 0.5;
    PersistedMesh {
        positions: vec![
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ],
        polygons: vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![3, 7, 6, 2],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
        ],
        ..Default::default()
    }
}

/// Square in the XY plane facing +Z
pub fn plane_mesh(size: f32) -> PersistedMesh {
    let h = size * 0.5;
    PersistedMesh {
        positions: vec![[-h, -h, 0.0], [h, -h, 0.0], [h, h, 0.0], [-h, h, 0.0]],
        polygons: vec![vec![0, 1, 2, 3]],
        ..Default::default()
    }
}

/// `cols` × `rows` quads of `cell` size in the XY plane, centered at the origin
pub fn grid_mesh(cols: u32, rows: u32, cell: f32) -> PersistedMesh {
    let width = cols as f32 * cell;
    let height = rows as f32 * cell;
    let mut positions = Vec::with_capacity(((cols + 1) * (rows + 1)) as usize);
    for j in 0..=rows {
        for i in 0..=cols {
            positions.push([
                i as f32 * cell - width * 0.5,
                j as f32 * cell - height * 0.5,
                0.0,
            ]);
        }
    }
    let stride = cols + 1;
    let mut polygons = Vec::with_capacity((cols * rows) as usize);
    for j in 0..rows {
        for i in 0..cols {
            let v = j * stride + i;
            polygons.push(vec![v, v + 1, v + 1 + stride, v + stride]);
        }
    }
    PersistedMesh {
        positions,
        polygons,
        ..Default::default()
    }
}

// ── Scene objects ───────────────────────────────────────────────

/// Create a cube object at a specific position.
pub fn cube_object_at(id: &str, name: &str, size: f32, pos: [f64; 3]) -> SceneObject {
    SceneObject {
        id: id.to_string(),
        name: name.to_string(),
        transform: Transform::at(pos),
        visible: true,
        mesh: cube_mesh(size),
        working_copy: None,
    }
}

/// Two unit cubes side by side on the X axis.
pub fn two_cube_scene() -> SceneFile {
    SceneFile {
        objects: vec![
            cube_object_at("left", "Left cube", 1.0, [-1.0, 0.0, 0.0]),
            cube_object_at("right", "Right cube", 1.0, [1.0, 0.0, 0.0]),
        ],
        ..SceneFile::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::MeshTopology;
    use crate::validation::MeshValidator;

    #[test]
    fn test_fixtures_are_valid() {
        for mesh in [cube_mesh(1.0), plane_mesh(2.0), grid_mesh(3, 2, 0.5)] {
            assert!(MeshValidator::new(&mesh).validate_all().is_empty());
            let topo = MeshTopology::from_persisted(&mesh).unwrap();
            assert!(topo.validate().is_ok());
        }
    }

    #[test]
    fn test_cube_is_closed() {
        let topo = MeshTopology::from_persisted(&cube_mesh(1.0)).unwrap();
        assert_eq!(topo.edge_count(), 12);
        assert!(topo.iter_edges().all(|(_, e)| e.faces().len() == 2));
        assert_eq!(topo.face_normal(CUBE_FRONT_FACE), Some(glam::Vec3::Z));
        assert_eq!(topo.face_normal(CUBE_BACK_FACE), Some(glam::Vec3::NEG_Z));
    }

    #[test]
    fn test_grid_counts() {
        let mesh = grid_mesh(3, 2, 1.0);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.face_count(), 6);
    }
}

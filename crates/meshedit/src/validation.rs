//! Mesh validation utilities.
//!
//! `MeshValidator` checks a host `PersistedMesh` before it is accepted as
//! storage: in-range indices, non-degenerate polygons and edges, sorted hidden
//! flags, finite positions.

use shared::PersistedMesh;

/// Validator for `PersistedMesh` integrity checks.
pub struct MeshValidator<'a> {
    mesh: &'a PersistedMesh,
}

impl<'a> MeshValidator<'a> {
    /// Create a new validator for the given mesh.
    pub fn new(mesh: &'a PersistedMesh) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.mesh.polygons.len()
    }

    /// Check that every polygon and loose edge index names a vertex.
    pub fn are_indices_in_range(&self) -> bool {
        let max_idx = self.vertex_count() as u32;
        self.mesh.polygons.iter().flatten().all(|&i| i < max_idx)
            && self.mesh.loose_edges.iter().flatten().all(|&i| i < max_idx)
    }

    /// Check that every polygon has at least three distinct corners.
    pub fn are_polygons_valid(&self) -> bool {
        self.mesh.polygons.iter().all(|poly| {
            let mut sorted = poly.clone();
            sorted.sort_unstable();
            sorted.dedup();
            poly.len() >= 3 && sorted.len() == poly.len()
        })
    }

    pub fn are_loose_edges_valid(&self) -> bool {
        self.mesh.loose_edges.iter().all(|[a, b]| a != b)
    }

    /// Hidden lists must be strictly ascending and in range.
    pub fn are_hidden_flags_valid(&self) -> bool {
        let ascending = |list: &[u32], len: usize| {
            list.windows(2).all(|w| w[0] < w[1]) && list.iter().all(|&i| (i as usize) < len)
        };
        ascending(&self.mesh.hidden_vertices, self.vertex_count())
            && ascending(&self.mesh.hidden_faces, self.face_count())
    }

    pub fn are_positions_finite(&self) -> bool {
        self.mesh.positions.iter().flatten().all(|c| c.is_finite())
    }

    /// Run all validation checks and return a list of error messages.
    /// An empty list means the mesh is valid.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.are_indices_in_range() {
            let max_idx = self.vertex_count() as u32;
            let out_of_range: Vec<_> = self
                .mesh
                .polygons
                .iter()
                .flatten()
                .chain(self.mesh.loose_edges.iter().flatten())
                .filter(|&&i| i >= max_idx)
                .take(5)
                .collect();
            errors.push(format!(
                "Indices out of range (vertex_count={}): {:?}",
                max_idx, out_of_range
            ));
        }

        if !self.are_polygons_valid() {
            errors.push("Some polygons have fewer than 3 distinct vertices".to_string());
        }

        if !self.are_loose_edges_valid() {
            errors.push("Some loose edges join a vertex to itself".to_string());
        }

        if !self.are_hidden_flags_valid() {
            errors.push("Hidden element lists are unsorted or out of range".to_string());
        }

        if !self.are_positions_finite() {
            errors.push("Some positions are not finite".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_triangle() -> PersistedMesh {
        PersistedMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            polygons: vec![vec![0, 1, 2]],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_triangle() {
        let mesh = simple_triangle();
        let v = MeshValidator::new(&mesh);
        assert_eq!(v.vertex_count(), 3);
        assert_eq!(v.face_count(), 1);
        assert!(v.validate_all().is_empty());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut mesh = simple_triangle();
        mesh.polygons[0][2] = 7;
        let errors = MeshValidator::new(&mesh).validate_all();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("[7]"));
    }

    #[test]
    fn test_repeated_corner() {
        let mut mesh = simple_triangle();
        mesh.polygons[0] = vec![0, 1, 1];
        assert!(!MeshValidator::new(&mesh).are_polygons_valid());
    }

    #[test]
    fn test_loose_edge_to_self() {
        let mut mesh = simple_triangle();
        mesh.loose_edges.push([2, 2]);
        assert!(!MeshValidator::new(&mesh).are_loose_edges_valid());
    }

    #[test]
    fn test_hidden_flags_must_ascend() {
        let mut mesh = simple_triangle();
        mesh.hidden_vertices = vec![2, 1];
        assert!(!MeshValidator::new(&mesh).are_hidden_flags_valid());
        mesh.hidden_vertices = vec![1, 2];
        assert!(MeshValidator::new(&mesh).are_hidden_flags_valid());
        mesh.hidden_faces = vec![1];
        assert!(!MeshValidator::new(&mesh).are_hidden_flags_valid());
    }

    #[test]
    fn test_nan_position() {
        let mut mesh = simple_triangle();
        mesh.positions[1][0] = f32::NAN;
        assert_eq!(MeshValidator::new(&mesh).validate_all().len(), 1);
    }
}

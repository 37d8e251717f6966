//! Editable mesh graph.
//!
//! `MeshTopology` is built from a host `PersistedMesh` when a session starts
//! tracking an object and written back on commit. Elements live in
//! index-addressed arenas: removing an element clears its `valid` flag instead
//! of shifting indices, so an index held by tool code keeps pointing at the
//! same slot until the next commit renumbers the mesh.

use std::fmt;

use glam::Vec3;
use shared::PersistedMesh;

use crate::error::TopologyError;

/// Kind of mesh element a query or hit refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Vertex,
    Edge,
    Face,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementKind::Vertex => "vertex",
            ElementKind::Edge => "edge",
            ElementKind::Face => "face",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Position in object-local space
    pub co: Vec3,
    pub hidden: bool,
    edges: Vec<u32>,
    valid: bool,
}

impl Vertex {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Edges using this vertex
    pub fn edges(&self) -> &[u32] {
        &self.edges
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    verts: [u32; 2],
    faces: Vec<u32>,
    valid: bool,
}

impl Edge {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn verts(&self) -> [u32; 2] {
        self.verts
    }

    /// Faces using this edge
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    /// The opposite endpoint, if `v` is one of the endpoints
    pub fn other(&self, v: u32) -> Option<u32> {
        match self.verts {
            [a, b] if a == v => Some(b),
            [a, b] if b == v => Some(a),
            _ => None,
        }
    }

    pub fn connects(&self, a: u32, b: u32) -> bool {
        self.verts == [a, b] || self.verts == [b, a]
    }

    /// Edge without faces
    pub fn is_loose(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn is_boundary(&self) -> bool {
        self.faces.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    verts: Vec<u32>,
    /// `edges[i]` joins `verts[i]` and `verts[i + 1]`
    edges: Vec<u32>,
    pub hidden: bool,
    valid: bool,
}

impl Face {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Vertex loop in winding order
    pub fn verts(&self) -> &[u32] {
        &self.verts
    }

    pub fn edges(&self) -> &[u32] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }
}

/// In-memory vertex/edge/face graph with explicit adjacency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshTopology {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    /// Bumped on every mutation
    version: u64,
}

impl MeshTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a host mesh. Face `i` of the result is polygon `i`.
    pub fn from_persisted(mesh: &PersistedMesh) -> Result<Self, TopologyError> {
        let mut topo = Self::new();
        for p in &mesh.positions {
            topo.add_vertex(Vec3::from_array(*p));
        }
        for &v in &mesh.hidden_vertices {
            topo.set_vertex_hidden(v, true)?;
        }
        for poly in &mesh.polygons {
            topo.add_face(poly)?;
        }
        for &f in &mesh.hidden_faces {
            topo.set_face_hidden(f, true)?;
        }
        for &[a, b] in &mesh.loose_edges {
            topo.add_edge(a, b)?;
        }
        topo.version = 0;
        Ok(topo)
    }

    /// Compact the live elements into the host storage format.
    ///
    /// Vertices and faces keep their relative order, so a graph that was never
    /// edited serializes to exactly the mesh it was built from.
    pub fn to_persisted(&self) -> PersistedMesh {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut positions = Vec::with_capacity(self.vertex_count());
        let mut hidden_vertices = Vec::new();
        for (i, v) in self.vertices.iter().enumerate().filter(|(_, v)| v.valid) {
            let new_index = positions.len() as u32;
            remap[i] = new_index;
            positions.push(v.co.to_array());
            if v.hidden {
                hidden_vertices.push(new_index);
            }
        }

        let mut polygons = Vec::with_capacity(self.face_count());
        let mut hidden_faces = Vec::new();
        for face in self.faces.iter().filter(|f| f.valid) {
            if face.hidden {
                hidden_faces.push(polygons.len() as u32);
            }
            polygons.push(face.verts.iter().map(|&v| remap[v as usize]).collect());
        }

        let loose_edges = self
            .edges
            .iter()
            .filter(|e| e.valid && e.faces.is_empty())
            .map(|e| [remap[e.verts[0] as usize], remap[e.verts[1] as usize]])
            .collect();

        PersistedMesh {
            positions,
            polygons,
            loose_edges,
            hidden_vertices,
            hidden_faces,
        }
    }

    /// Mutation counter; a `HitInfo` is only meaningful for the version it was cast against.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Carry on the counter of the graph this one replaces, so versions never repeat
    pub(crate) fn continue_version(&mut self, previous: u64) {
        self.version = previous + 1;
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    // ── Element access ────────────────────────────────────────

    fn check_vertex(&self, v: u32) -> Result<&Vertex, TopologyError> {
        let vert = self.vertices.get(v as usize).ok_or(TopologyError::OutOfRange {
            kind: ElementKind::Vertex,
            index: v,
        })?;
        if !vert.valid {
            return Err(TopologyError::Removed {
                kind: ElementKind::Vertex,
                index: v,
            });
        }
        Ok(vert)
    }

    fn check_edge(&self, e: u32) -> Result<&Edge, TopologyError> {
        let edge = self.edges.get(e as usize).ok_or(TopologyError::OutOfRange {
            kind: ElementKind::Edge,
            index: e,
        })?;
        if !edge.valid {
            return Err(TopologyError::Removed {
                kind: ElementKind::Edge,
                index: e,
            });
        }
        Ok(edge)
    }

    fn check_face(&self, f: u32) -> Result<&Face, TopologyError> {
        let face = self.faces.get(f as usize).ok_or(TopologyError::OutOfRange {
            kind: ElementKind::Face,
            index: f,
        })?;
        if !face.valid {
            return Err(TopologyError::Removed {
                kind: ElementKind::Face,
                index: f,
            });
        }
        Ok(face)
    }

    /// Check that `index` names a live element of `kind`.
    pub fn check(&self, kind: ElementKind, index: u32) -> Result<(), TopologyError> {
        match kind {
            ElementKind::Vertex => self.check_vertex(index).map(|_| ()),
            ElementKind::Edge => self.check_edge(index).map(|_| ()),
            ElementKind::Face => self.check_face(index).map(|_| ()),
        }
    }

    pub fn is_valid(&self, kind: ElementKind, index: u32) -> bool {
        self.check(kind, index).is_ok()
    }

    pub fn vertex(&self, v: u32) -> Option<&Vertex> {
        self.check_vertex(v).ok()
    }

    pub fn edge(&self, e: u32) -> Option<&Edge> {
        self.check_edge(e).ok()
    }

    pub fn face(&self, f: u32) -> Option<&Face> {
        self.check_face(f).ok()
    }

    /// Number of live vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.valid).count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.valid).count()
    }

    pub fn face_count(&self) -> usize {
        self.faces.iter().filter(|f| f.valid).count()
    }

    pub fn iter_vertices(&self) -> impl Iterator<Item = (u32, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.valid)
            .map(|(i, v)| (i as u32, v))
    }

    pub fn iter_edges(&self) -> impl Iterator<Item = (u32, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.valid)
            .map(|(i, e)| (i as u32, e))
    }

    pub fn iter_faces(&self) -> impl Iterator<Item = (u32, &Face)> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.valid)
            .map(|(i, f)| (i as u32, f))
    }

    pub fn position(&self, v: u32) -> Option<Vec3> {
        self.vertex(v).map(|vert| vert.co)
    }

    pub fn find_edge(&self, a: u32, b: u32) -> Option<u32> {
        let vert = self.vertex(a)?;
        vert.edges
            .iter()
            .copied()
            .find(|&e| self.edges[e as usize].connects(a, b))
    }

    /// Live face made of exactly this vertex set, in any winding
    pub fn find_face(&self, verts: &[u32]) -> Option<u32> {
        let first = self.vertex(*verts.first()?)?;
        let mut wanted = verts.to_vec();
        wanted.sort_unstable();
        first
            .edges
            .iter()
            .flat_map(|&e| self.edges[e as usize].faces.iter().copied())
            .find(|&f| {
                let face = &self.faces[f as usize];
                if face.verts.len() != wanted.len() {
                    return false;
                }
                let mut have = face.verts.clone();
                have.sort_unstable();
                have == wanted
            })
    }

    /// Faces around a vertex, each listed once
    pub fn vertex_faces(&self, v: u32) -> Vec<u32> {
        let Some(vert) = self.vertex(v) else {
            return Vec::new();
        };
        let mut faces: Vec<u32> = Vec::new();
        for &e in &vert.edges {
            for &f in &self.edges[e as usize].faces {
                if !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    pub fn edge_faces(&self, e: u32) -> &[u32] {
        self.edge(e).map(|edge| edge.faces.as_slice()).unwrap_or(&[])
    }

    /// Hidden when an endpoint is hidden or every face using it is hidden
    pub fn edge_hidden(&self, e: u32) -> bool {
        let Some(edge) = self.edge(e) else {
            return false;
        };
        edge.verts.iter().any(|&v| self.vertices[v as usize].hidden)
            || (!edge.faces.is_empty()
                && edge.faces.iter().all(|&f| self.faces[f as usize].hidden))
    }

    pub fn edge_positions(&self, e: u32) -> Option<(Vec3, Vec3)> {
        let edge = self.edge(e)?;
        Some((
            self.vertices[edge.verts[0] as usize].co,
            self.vertices[edge.verts[1] as usize].co,
        ))
    }

    pub fn edge_midpoint(&self, e: u32) -> Option<Vec3> {
        self.edge_positions(e).map(|(a, b)| (a + b) * 0.5)
    }

    /// Average of the face's corner positions
    pub fn face_center(&self, f: u32) -> Option<Vec3> {
        let face = self.face(f)?;
        let sum: Vec3 = face
            .verts
            .iter()
            .map(|&v| self.vertices[v as usize].co)
            .sum();
        Some(sum / face.verts.len() as f32)
    }

    /// Newell normal; zero for collapsed faces
    pub fn face_normal(&self, f: u32) -> Option<Vec3> {
        let face = self.face(f)?;
        let n = face.verts.len();
        let mut normal = Vec3::ZERO;
        for i in 0..n {
            let a = self.vertices[face.verts[i] as usize].co;
            let b = self.vertices[face.verts[(i + 1) % n] as usize].co;
            normal += Vec3::new(
                (a.y - b.y) * (a.z + b.z),
                (a.z - b.z) * (a.x + b.x),
                (a.x - b.x) * (a.y + b.y),
            );
        }
        Some(normal.normalize_or_zero())
    }

    /// Fan triangulation of a face
    pub fn face_triangles(&self, f: u32) -> Vec<[u32; 3]> {
        let Some(face) = self.face(f) else {
            return Vec::new();
        };
        (1..face.verts.len() - 1)
            .map(|i| [face.verts[0], face.verts[i], face.verts[i + 1]])
            .collect()
    }

    // ── Construction ──────────────────────────────────────────

    pub fn add_vertex(&mut self, co: Vec3) -> u32 {
        self.vertices.push(Vertex {
            co,
            hidden: false,
            edges: Vec::new(),
            valid: true,
        });
        self.touch();
        (self.vertices.len() - 1) as u32
    }

    /// Add an edge, or return the one already joining `a` and `b`.
    pub fn add_edge(&mut self, a: u32, b: u32) -> Result<u32, TopologyError> {
        if a == b {
            return Err(TopologyError::DegenerateEdge);
        }
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if let Some(e) = self.find_edge(a, b) {
            return Ok(e);
        }
        let e = self.edges.len() as u32;
        self.edges.push(Edge {
            verts: [a, b],
            faces: Vec::new(),
            valid: true,
        });
        self.vertices[a as usize].edges.push(e);
        self.vertices[b as usize].edges.push(e);
        self.touch();
        Ok(e)
    }

    /// Add a face over an ordered vertex loop, creating missing edges.
    pub fn add_face(&mut self, verts: &[u32]) -> Result<u32, TopologyError> {
        if verts.len() < 3 {
            return Err(TopologyError::DegenerateFace(verts.len()));
        }
        let mut distinct = verts.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != verts.len() {
            return Err(TopologyError::DegenerateFace(distinct.len()));
        }
        for &v in verts {
            self.check_vertex(v)?;
        }
        if let Some(existing) = self.find_face(verts) {
            return Err(TopologyError::DuplicateFace(existing));
        }

        let n = verts.len();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            edges.push(self.add_edge(verts[i], verts[(i + 1) % n])?);
        }
        let f = self.faces.len() as u32;
        for &e in &edges {
            self.edges[e as usize].faces.push(f);
        }
        self.faces.push(Face {
            verts: verts.to_vec(),
            edges,
            hidden: false,
            valid: true,
        });
        self.touch();
        Ok(f)
    }

    // ── Removal ───────────────────────────────────────────────

    /// Remove a face; its edges stay (possibly loose).
    pub fn remove_face(&mut self, f: u32) -> Result<(), TopologyError> {
        let edges = self.check_face(f)?.edges.clone();
        for e in edges {
            self.edges[e as usize].faces.retain(|&x| x != f);
        }
        self.faces[f as usize].valid = false;
        self.touch();
        Ok(())
    }

    /// Remove an edge and every face using it.
    pub fn remove_edge(&mut self, e: u32) -> Result<(), TopologyError> {
        let edge = self.check_edge(e)?.clone();
        for f in edge.faces {
            self.remove_face(f)?;
        }
        for v in edge.verts {
            self.vertices[v as usize].edges.retain(|&x| x != e);
        }
        self.edges[e as usize].valid = false;
        self.touch();
        Ok(())
    }

    /// Remove a vertex and everything attached to it.
    pub fn remove_vertex(&mut self, v: u32) -> Result<(), TopologyError> {
        let edges = self.check_vertex(v)?.edges.clone();
        for e in edges {
            self.remove_edge(e)?;
        }
        self.vertices[v as usize].valid = false;
        self.touch();
        Ok(())
    }

    // ── Attributes ────────────────────────────────────────────

    pub fn set_position(&mut self, v: u32, co: Vec3) -> Result<(), TopologyError> {
        self.check_vertex(v)?;
        self.vertices[v as usize].co = co;
        self.touch();
        Ok(())
    }

    pub fn translate_vertex(&mut self, v: u32, delta: Vec3) -> Result<(), TopologyError> {
        let co = self.check_vertex(v)?.co;
        self.set_position(v, co + delta)
    }

    pub fn set_vertex_hidden(&mut self, v: u32, hidden: bool) -> Result<(), TopologyError> {
        self.check_vertex(v)?;
        self.vertices[v as usize].hidden = hidden;
        self.touch();
        Ok(())
    }

    pub fn set_face_hidden(&mut self, f: u32, hidden: bool) -> Result<(), TopologyError> {
        self.check_face(f)?;
        self.faces[f as usize].hidden = hidden;
        self.touch();
        Ok(())
    }

    // ── Compound edits ────────────────────────────────────────

    /// Weld `remove` into `keep`. Faces that collapse below three corners are
    /// dropped; the others are rebuilt around `keep` and get new indices.
    pub fn merge_vertices(&mut self, keep: u32, remove: u32) -> Result<(), TopologyError> {
        if keep == remove {
            return Ok(());
        }
        self.check_vertex(keep)?;
        let removed = self.check_vertex(remove)?;

        let loose_neighbours: Vec<u32> = removed
            .edges
            .iter()
            .map(|&e| &self.edges[e as usize])
            .filter(|e| e.is_loose())
            .filter_map(|e| e.other(remove))
            .collect();
        let rebuilt: Vec<(Vec<u32>, bool)> = self
            .vertex_faces(remove)
            .into_iter()
            .map(|f| {
                let face = &self.faces[f as usize];
                let mut verts: Vec<u32> = face
                    .verts
                    .iter()
                    .map(|&v| if v == remove { keep } else { v })
                    .collect();
                dedup_loop(&mut verts);
                (verts, face.hidden)
            })
            .collect();

        self.remove_vertex(remove)?;
        for other in loose_neighbours {
            if other != keep {
                self.add_edge(keep, other)?;
            }
        }
        for (verts, hidden) in rebuilt {
            if verts.len() < 3 || has_repeats(&verts) || self.find_face(&verts).is_some() {
                continue;
            }
            let f = self.add_face(&verts)?;
            self.faces[f as usize].hidden = hidden;
        }
        Ok(())
    }

    /// Join the two faces sharing `e` into one and drop the edge.
    /// Returns the merged face.
    pub fn dissolve_edge(&mut self, e: u32) -> Result<u32, TopologyError> {
        let edge = self.check_edge(e)?.clone();
        if edge.faces.len() != 2 {
            return Err(TopologyError::NotManifold(e));
        }
        let [a, b] = edge.verts;
        let face_a = &self.faces[edge.faces[0] as usize];
        let face_b = &self.faces[edge.faces[1] as usize];

        // Walk A from b round to a, then B from a round to b.
        let reversed = !has_directed(&face_a.verts, a, b);
        let loop_a = oriented(&face_a.verts, a, b);
        let loop_b = oriented(&face_b.verts, b, a);
        let path_a = rotate_to(&loop_a, b);
        let path_b = rotate_to(&loop_b, a);
        let mut merged = path_a;
        merged.extend_from_slice(&path_b[1..path_b.len() - 1]);
        if reversed {
            merged.reverse();
        }
        if has_repeats(&merged) {
            return Err(TopologyError::NotManifold(e));
        }
        let hidden = face_a.hidden && face_b.hidden;

        self.remove_edge(e)?;
        let f = self.add_face(&merged)?;
        self.faces[f as usize].hidden = hidden;
        Ok(f)
    }

    /// Insert a vertex on `e` at `factor` (0 = first endpoint, 1 = second).
    /// Faces using the edge are rebuilt and get new indices.
    pub fn split_edge(&mut self, e: u32, factor: f32) -> Result<u32, TopologyError> {
        let edge = self.check_edge(e)?.clone();
        let [a, b] = edge.verts;
        let co = self.vertices[a as usize]
            .co
            .lerp(self.vertices[b as usize].co, factor.clamp(0.0, 1.0));
        let faces: Vec<(Vec<u32>, bool)> = edge
            .faces
            .iter()
            .map(|&f| {
                let face = &self.faces[f as usize];
                (face.verts.clone(), face.hidden)
            })
            .collect();

        let v = self.add_vertex(co);
        self.remove_edge(e)?;
        self.add_edge(a, v)?;
        self.add_edge(v, b)?;
        for (mut verts, hidden) in faces {
            let n = verts.len();
            if let Some(i) = (0..n).find(|&i| {
                let (x, y) = (verts[i], verts[(i + 1) % n]);
                (x == a && y == b) || (x == b && y == a)
            }) {
                verts.insert(i + 1, v);
            }
            let f = self.add_face(&verts)?;
            self.faces[f as usize].hidden = hidden;
        }
        Ok(v)
    }

    // ── Validation ────────────────────────────────────────────

    /// Cross-check every live element's adjacency.
    pub fn validate(&self) -> Result<(), TopologyError> {
        for (f, face) in self.iter_faces() {
            let n = face.verts.len();
            if n < 3 {
                return Err(TopologyError::DegenerateFace(n));
            }
            if face.edges.len() != n {
                return Err(TopologyError::BrokenAdjacency(format!(
                    "face {f} has {n} corners but {} edges",
                    face.edges.len()
                )));
            }
            for (i, &v) in face.verts.iter().enumerate() {
                self.check_vertex(v)?;
                let e = face.edges[i];
                let edge = self.check_edge(e)?;
                if !edge.connects(v, face.verts[(i + 1) % n]) {
                    return Err(TopologyError::BrokenAdjacency(format!(
                        "face {f} side {i} does not match edge {e}"
                    )));
                }
                if !edge.faces.contains(&f) {
                    return Err(TopologyError::BrokenAdjacency(format!(
                        "edge {e} does not list face {f}"
                    )));
                }
            }
        }

        for (e, edge) in self.iter_edges() {
            for v in edge.verts {
                if !self.check_vertex(v)?.edges.contains(&e) {
                    return Err(TopologyError::BrokenAdjacency(format!(
                        "vertex {v} does not list edge {e}"
                    )));
                }
            }
            for &f in &edge.faces {
                if !self.check_face(f)?.edges.contains(&e) {
                    return Err(TopologyError::BrokenAdjacency(format!(
                        "face {f} does not list edge {e}"
                    )));
                }
            }
        }

        for (v, vert) in self.iter_vertices() {
            for &e in &vert.edges {
                if !self.check_edge(e)?.verts.contains(&v) {
                    return Err(TopologyError::BrokenAdjacency(format!(
                        "edge {e} does not use vertex {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn has_directed(verts: &[u32], a: u32, b: u32) -> bool {
    let n = verts.len();
    (0..n).any(|i| verts[i] == a && verts[(i + 1) % n] == b)
}

/// Loop wound so that `a` is directly followed by `b`
fn oriented(verts: &[u32], a: u32, b: u32) -> Vec<u32> {
    if has_directed(verts, a, b) {
        verts.to_vec()
    } else {
        verts.iter().rev().copied().collect()
    }
}

fn rotate_to(verts: &[u32], start: u32) -> Vec<u32> {
    let pos = verts.iter().position(|&v| v == start).unwrap_or(0);
    verts[pos..].iter().chain(&verts[..pos]).copied().collect()
}

/// Drop consecutive repeats, including the wrap-around pair
fn dedup_loop(verts: &mut Vec<u32>) {
    verts.dedup();
    while verts.len() > 1 && verts.first() == verts.last() {
        verts.pop();
    }
}

fn has_repeats(verts: &[u32]) -> bool {
    let mut sorted = verts.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).any(|w| w[0] == w[1])
}

//! Transient draw geometry for selection and preview feedback.
//!
//! Batches are rebuilt from scratch every frame and never patched.

use glam::Vec3;
use shared::ObjectId;

use crate::session::ObjectSession;
use crate::settings::HighlightStyle;
use crate::topology::ElementKind;

/// Elements of one object to highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSet {
    Vertices(Vec<u32>),
    Edges(Vec<u32>),
    Faces(Vec<u32>),
}

impl ElementSet {
    /// A single element
    pub fn single(kind: ElementKind, index: u32) -> Self {
        match kind {
            ElementKind::Vertex => ElementSet::Vertices(vec![index]),
            ElementKind::Edge => ElementSet::Edges(vec![index]),
            ElementKind::Face => ElementSet::Faces(vec![index]),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            ElementSet::Vertices(_) => ElementKind::Vertex,
            ElementSet::Edges(_) => ElementKind::Edge,
            ElementSet::Faces(_) => ElementKind::Face,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPrimitive {
    Points,
    Lines,
    Triangles,
}

/// World-space geometry ready for the host renderer
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub object: ObjectId,
    pub primitive: BatchPrimitive,
    /// Point size or line width in pixels
    pub size: f32,
    /// 7 floats per vertex: position(3) + color(4)
    pub vertices: Vec<f32>,
}

impl DrawBatch {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 7
    }

    fn push(&mut self, p: Vec3, color: [f32; 4]) {
        self.vertices.extend_from_slice(&[p.x, p.y, p.z]);
        self.vertices.extend_from_slice(&color);
    }
}

/// Receives batches when the controller draws
pub trait DrawSink {
    fn draw_batch(&mut self, batch: &DrawBatch);
}

impl DrawSink for Vec<DrawBatch> {
    fn draw_batch(&mut self, batch: &DrawBatch) {
        self.push(batch.clone());
    }
}

#[derive(Debug, Clone, Default)]
pub struct HighlightBatcher {
    batches: Vec<DrawBatch>,
}

impl HighlightBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch for `elements` of a tracked object.
    /// Indices that are not live in the topology are skipped; returns false
    /// when nothing was left to draw.
    pub fn build_batch(
        &mut self,
        session: &ObjectSession,
        elements: &ElementSet,
        style: &HighlightStyle,
    ) -> bool {
        let topo = session.topology();
        let transform = session.transform();
        let color = style.rgba();
        let world = |v: u32| topo.position(v).map(|co| transform.to_world(co));

        let mut batch = DrawBatch {
            object: session.object().clone(),
            primitive: BatchPrimitive::Points,
            size: style.size,
            vertices: Vec::new(),
        };
        match elements {
            ElementSet::Vertices(list) => {
                for p in list.iter().filter_map(|&v| world(v)) {
                    batch.push(p, color);
                }
            }
            ElementSet::Edges(list) => {
                batch.primitive = BatchPrimitive::Lines;
                for &e in list {
                    if let Some((a, b)) = topo.edge_positions(e) {
                        batch.push(transform.to_world(a), color);
                        batch.push(transform.to_world(b), color);
                    }
                }
            }
            ElementSet::Faces(list) => {
                batch.primitive = BatchPrimitive::Triangles;
                for &f in list {
                    for tri in topo.face_triangles(f) {
                        for p in tri.iter().filter_map(|&v| world(v)) {
                            batch.push(p, color);
                        }
                    }
                }
            }
        }

        if batch.vertices.is_empty() {
            return false;
        }
        self.batches.push(batch);
        true
    }

    pub fn clear_batches(&mut self) {
        self.batches.clear();
    }

    /// Hand every batch to `sink`; returns how many were drawn
    pub fn draw(&self, sink: &mut impl DrawSink) -> usize {
        for batch in &self.batches {
            sink.draw_batch(batch);
        }
        self.batches.len()
    }

    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::host::MemoryScene;
    use crate::options::TrackOptions;
    use crate::settings::HighlightSettings;
    use shared::Transform;

    fn cube_session() -> ObjectSession {
        let mut scene = MemoryScene::new();
        let id = scene.insert("Cube", fixtures::cube_mesh(2.0), Transform::at([1.0, 0.0, 0.0]));
        ObjectSession::open(&scene, &id, TrackOptions::empty()).unwrap()
    }

    #[test]
    fn test_edge_batch_in_world_space() {
        let session = cube_session();
        let style = HighlightSettings::default().edge;
        let mut batcher = HighlightBatcher::new();
        assert!(batcher.build_batch(&session, &ElementSet::Edges(vec![0]), &style));
        let batch = &batcher.batches()[0];
        assert_eq!(batch.primitive, BatchPrimitive::Lines);
        assert_eq!(batch.vertex_count(), 2);
        // Cube of size 2 moved by +1 on X spans x in [0, 2]
        assert!(batch.vertices[0] == 0.0 || batch.vertices[0] == 2.0);
        assert_eq!(&batch.vertices[3..7], &style.rgba());
    }

    #[test]
    fn test_face_batch_triangulates() {
        let session = cube_session();
        let mut batcher = HighlightBatcher::new();
        let style = HighlightSettings::default().face;
        batcher.build_batch(&session, &ElementSet::Faces(vec![0, 1]), &style);
        assert_eq!(batcher.batches()[0].vertex_count(), 12);
    }

    #[test]
    fn test_invalid_indices_skipped() {
        let session = cube_session();
        let mut batcher = HighlightBatcher::new();
        let style = HighlightSettings::default().vertex;
        assert!(!batcher.build_batch(&session, &ElementSet::Vertices(vec![99]), &style));
        assert!(batcher.is_empty());
        assert!(batcher.build_batch(&session, &ElementSet::Vertices(vec![99, 3]), &style));
        assert_eq!(batcher.batches()[0].vertex_count(), 1);
    }

    #[test]
    fn test_draw_and_clear() {
        let session = cube_session();
        let mut batcher = HighlightBatcher::new();
        let style = HighlightSettings::default().vertex;
        batcher.build_batch(&session, &ElementSet::single(ElementKind::Vertex, 0), &style);
        batcher.build_batch(&session, &ElementSet::single(ElementKind::Edge, 0), &style);
        let mut sink: Vec<DrawBatch> = Vec::new();
        assert_eq!(batcher.draw(&mut sink), 2);
        assert_eq!(sink.len(), 2);
        batcher.clear_batches();
        assert_eq!(batcher.draw(&mut sink), 0);
    }
}

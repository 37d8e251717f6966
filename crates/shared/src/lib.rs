use serde::{Deserialize, Serialize};

/// Уникальный идентификатор объекта в сцене
pub type ObjectId = String;

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

/// Трансформация объекта (позиция, углы Эйлера XYZ в радианах, масштаб)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }

    /// Трансформация только со смещением
    pub fn at(position: [f64; 3]) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Откуда читается и куда пишется сетка объекта
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshSource {
    /// Сохранённая сетка объекта
    Persisted,
    /// Живая рабочая копия (режим редактирования хоста)
    WorkingCopy,
}

/// Сетка в формате хранения хоста.
///
/// Рёбра не хранятся явно: они выводятся из контуров полигонов, плюс
/// отдельный список «свободных» рёбер без граней.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedMesh {
    /// Позиции вершин в локальных координатах объекта
    pub positions: Vec<[f32; 3]>,
    /// Полигоны: упорядоченные контуры индексов вершин
    pub polygons: Vec<Vec<u32>>,
    /// Рёбра, не принадлежащие ни одному полигону
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loose_edges: Vec<[u32; 2]>,
    /// Индексы скрытых вершин (по возрастанию)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_vertices: Vec<u32>,
    /// Индексы скрытых полигонов (по возрастанию)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_faces: Vec<u32>,
}

impl PersistedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Число уникальных рёбер (из полигонов и свободных рёбер)
    pub fn edge_count(&self) -> usize {
        let mut keys = std::collections::HashSet::new();
        for poly in &self.polygons {
            for (i, &a) in poly.iter().enumerate() {
                let b = poly[(i + 1) % poly.len()];
                keys.insert((a.min(b), a.max(b)));
            }
        }
        for &[a, b] in &self.loose_edges {
            keys.insert((a.min(b), a.max(b)));
        }
        keys.len()
    }
}

/// Объект сцены с сеткой
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    /// Видимость объекта во вьюпорте
    #[serde(default = "default_true")]
    pub visible: bool,
    pub mesh: PersistedMesh,
    /// Рабочая копия, если объект уже открыт в режиме редактирования
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_copy: Option<PersistedMesh>,
}

/// Файл сцены: список объектов с сетками
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    /// Версия формата
    #[serde(default = "default_version")]
    pub version: u32,
    pub objects: Vec<SceneObject>,
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            version: 1,
            objects: Vec::new(),
        }
    }
}

impl SceneFile {
    /// Найти объект по ID
    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(val: &T) {
        let json = serde_json::to_string(val).expect("serialize");
        let back: T = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(*val, back);
    }

    fn quad() -> PersistedMesh {
        PersistedMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            polygons: vec![vec![0, 1, 2, 3]],
            ..Default::default()
        }
    }

    // --- Transform ---

    #[test]
    fn test_transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.scale, [1.0; 3]);
        assert_eq!(t.position, [0.0; 3]);
        roundtrip(&t);
    }

    #[test]
    fn test_transform_at() {
        let t = Transform::at([1.0, 2.0, 3.0]);
        assert_eq!(t.position, [1.0, 2.0, 3.0]);
        assert_eq!(t.scale, [1.0; 3]);
    }

    // --- MeshSource ---

    #[test]
    fn test_mesh_source_serde() {
        let json = serde_json::to_string(&MeshSource::WorkingCopy).unwrap();
        assert_eq!(json, r#""working_copy""#);
        roundtrip(&MeshSource::Persisted);
    }

    // --- PersistedMesh ---

    #[test]
    fn test_persisted_mesh_counts() {
        let m = quad();
        assert_eq!(m.vertex_count(), 4);
        assert_eq!(m.face_count(), 1);
        assert_eq!(m.edge_count(), 4);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_persisted_mesh_loose_edge_counted_once() {
        let mut m = quad();
        m.loose_edges.push([2, 0]);
        m.loose_edges.push([0, 2]);
        assert_eq!(m.edge_count(), 5);
    }

    #[test]
    fn test_persisted_mesh_omits_empty_lists() {
        let json = serde_json::to_string(&quad()).unwrap();
        assert!(!json.contains("loose_edges"));
        assert!(!json.contains("hidden_faces"));
        roundtrip(&quad());
    }

    // --- SceneFile ---

    #[test]
    fn test_scene_file_defaults() {
        let json = r#"{"objects": [{"id": "a", "name": "A", "mesh": {"positions": [], "polygons": []}}]}"#;
        let scene: SceneFile = serde_json::from_str(json).unwrap();
        assert_eq!(scene.version, 1);
        let obj = scene.object("a").unwrap();
        assert!(obj.visible);
        assert!(obj.working_copy.is_none());
        assert_eq!(obj.transform, Transform::new());
        assert!(scene.object("b").is_none());
    }
}

// Library crate: the edit-session engine plus the in-memory host, fixtures and
// harness used by integration tests and the demo binary.

pub mod controller;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod highlight;
pub mod hit;
pub mod host;
pub mod options;
pub mod picking;
pub mod registry;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod topology;
pub mod transform;
pub mod undo;
pub mod validation;

pub use controller::{SessionController, SessionState, ToolStatus};
pub use error::{HostError, SessionError, TopologyError};
pub use hit::HitInfo;
pub use host::{Host, MemoryScene};
pub use options::{CastOptions, TrackOptions};
pub use registry::Registry;
pub use settings::EngineSettings;
pub use topology::{ElementKind, MeshTopology};

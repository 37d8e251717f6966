use shared::{MeshSource, ObjectId, PersistedMesh};

use crate::error::HostError;
use crate::host::Host;

/// Frozen copy of an object's stored mesh, taken when tracking starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    object: ObjectId,
    source: MeshSource,
    mesh: PersistedMesh,
}

impl Snapshot {
    /// Read the current mesh of `object` from `source`
    pub fn capture(host: &impl Host, object: &str, source: MeshSource) -> Result<Self, HostError> {
        Ok(Self {
            object: object.to_string(),
            source,
            mesh: host.read_mesh(object, source)?,
        })
    }

    pub fn object(&self) -> &ObjectId {
        &self.object
    }

    pub fn source(&self) -> MeshSource {
        self.source
    }

    pub fn mesh(&self) -> &PersistedMesh {
        &self.mesh
    }

    /// Write the frozen mesh back to the host
    pub fn restore(&self, host: &mut impl Host) -> Result<(), HostError> {
        host.write_mesh(&self.object, self.source, &self.mesh)
    }
}

//! Commit, undo and redo

use shared::PersistedMesh;

use super::SessionController;
use crate::error::{HostError, SessionError};
use crate::host::Host;
use crate::undo::UndoEntry;

impl<H: Host> SessionController<'_, H> {
    /// Write the object's working topology to the host and stage an undo
    /// entry with the state it replaced.
    ///
    /// Returns false, leaving host and history untouched, when the object is
    /// not tracked, its topology fails validation, nothing changed, or the
    /// host rejects the write.
    pub fn stage_commit(&mut self, object: &str, rebuild_ray: bool) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(idx) = self.session_index(object) else {
            tracing::debug!("stage_commit: `{}` is not tracked", object);
            return false;
        };
        let session = &mut self.sessions[idx];

        if let Err(e) = session.topology().validate() {
            tracing::warn!("Refusing to commit `{}`: {}", object, e);
            return false;
        }
        let mesh = session.topology().to_persisted();
        if &mesh == session.committed() {
            tracing::debug!("stage_commit: `{}` unchanged", object);
            return false;
        }
        if let Err(e) = self.host.write_mesh(object, session.source(), &mesh) {
            tracing::error!("Commit of `{}` failed: {}", object, e);
            return false;
        }

        self.undo.stage(object, session.committed().clone());
        if let Err(e) = session.reload(mesh) {
            tracing::error!("Reloading `{}` after commit failed: {}", object, e);
        }
        if rebuild_ray {
            if let Err(e) = session.rebuild_ray(&self.host) {
                tracing::warn!("Rebuilding ray structure of `{}` failed: {}", object, e);
            }
        }
        tracing::debug!(
            "Staged commit of `{}` ({} faces)",
            object,
            session.topology().face_count()
        );
        true
    }

    /// Make all staged commits one undo step
    pub fn push_commits(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        let objects = self.undo.staged_len();
        if !self.undo.push() {
            return false;
        }
        tracing::info!("Committed edit of {} object(s), {} undo step(s)", objects, self.undo.len());
        true
    }

    /// Roll back staged but unpushed commits
    pub fn discard_commits(&mut self) -> usize {
        let staged = self.undo.take_staged();
        let count = staged.len();
        for entry in staged {
            if let Err(e) = self.restore_object(&entry.object, entry.mesh, true) {
                tracing::error!("Discarding commit of `{}` failed: {}", entry.object, e);
            }
        }
        count
    }

    /// Revert the most recent undo step on every object it touched
    pub fn undo_commits(&mut self, rebuild_ray: bool) -> bool {
        if !self.is_open() {
            return false;
        }
        if self.undo.staged_len() > 0 {
            tracing::warn!("Undo with unpushed commits; discarding them");
            self.discard_commits();
        }
        let Some(step) = self.undo.pop_step() else {
            return false;
        };
        let replaced = self.apply_step(step, rebuild_ray);
        self.undo.push_redo(replaced);
        tracing::info!("Undo ({} step(s) left)", self.undo.len());
        true
    }

    /// Re-apply the most recently undone step
    pub fn redo_commits(&mut self, rebuild_ray: bool) -> bool {
        if !self.is_open() {
            return false;
        }
        if self.undo.staged_len() > 0 {
            self.discard_commits();
        }
        let Some(step) = self.undo.pop_redo() else {
            return false;
        };
        let replaced = self.apply_step(step, rebuild_ray);
        self.undo.record_step(replaced);
        tracing::info!("Redo ({} step(s) to undo)", self.undo.len());
        true
    }

    pub fn can_undo(&self) -> bool {
        self.is_open() && self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.is_open() && self.undo.can_redo()
    }

    /// Undo steps currently held
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Resync the cached transform and ray structure with the current topology
    pub fn rebuild_ray(&mut self, object: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(idx) = self.session_index(object) else {
            return false;
        };
        match self.sessions[idx].rebuild_ray(&self.host) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Rebuilding ray structure of `{}` failed: {}", object, e);
                false
            }
        }
    }

    /// Adopt a mesh written to the host behind the session's back.
    ///
    /// The host mesh becomes the object's topology and committed state, and
    /// the state it replaced is staged for undo like a `stage_commit`.
    /// Returns false when the object is not tracked, the host mesh is
    /// unchanged or cannot be read or built.
    pub fn resync_from_host(&mut self, object: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(idx) = self.session_index(object) else {
            return false;
        };
        let session = &mut self.sessions[idx];
        let mesh = match self.host.read_mesh(object, session.source()) {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::warn!("Cannot resync `{}`: {}", object, e);
                return false;
            }
        };
        if &mesh == session.committed() {
            return false;
        }
        let previous = session.committed().clone();
        if let Err(e) = session.reload(mesh) {
            tracing::warn!("Host mesh of `{}` has broken topology: {}", object, e);
            return false;
        }
        self.undo.stage(object, previous);
        if let Err(e) = session.rebuild_ray(&self.host) {
            tracing::warn!("Rebuilding ray structure of `{}` failed: {}", object, e);
        }
        tracing::debug!("Resynced `{}` from host", object);
        true
    }

    /// Write each entry's mesh back; returns the states it replaced
    fn apply_step(&mut self, step: Vec<UndoEntry>, rebuild_ray: bool) -> Vec<UndoEntry> {
        let mut replaced = Vec::with_capacity(step.len());
        for entry in step {
            let Some(current) = self.session(&entry.object).map(|s| s.committed().clone()) else {
                continue;
            };
            match self.restore_object(&entry.object, entry.mesh, rebuild_ray) {
                Ok(()) => replaced.push(UndoEntry {
                    object: entry.object,
                    mesh: current,
                    ordinal: 0,
                }),
                Err(e) => tracing::error!("Restoring `{}` failed: {}", entry.object, e),
            }
        }
        replaced
    }

    /// Write `mesh` to the host and reload the object's topology from it
    pub(super) fn restore_object(
        &mut self,
        object: &str,
        mesh: PersistedMesh,
        rebuild_ray: bool,
    ) -> Result<(), SessionError> {
        let idx = self
            .session_index(object)
            .ok_or_else(|| HostError::UnknownObject(object.to_string()))?;
        let session = &mut self.sessions[idx];
        self.host.write_mesh(object, session.source(), &mesh)?;
        session.reload(mesh)?;
        if rebuild_ray {
            session.rebuild_ray(&self.host)?;
        }
        Ok(())
    }
}

//! Session lifecycle: frames, tool status, close

use super::SessionController;
use crate::error::SessionError;
use crate::hit::HitInfo;
use crate::highlight::{DrawSink, ElementSet};
use crate::host::Host;
use crate::settings::HighlightStyle;
use crate::topology::ElementKind;

/// Whether a session still grants edit rights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Status reported by the tool's interactive loop each dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Running,
    Pass,
    Confirm,
    Cancel,
    Error,
}

impl<H: Host> SessionController<'_, H> {
    // ── Frame protocol ────────────────────────────────────────

    /// Start of a frame: drop last frame's highlight batches
    pub fn begin_frame(&mut self) {
        self.highlight.clear_batches();
    }

    /// End of a frame: commits that were staged but never pushed are rolled back
    pub fn end_frame(&mut self) {
        if self.undo.staged_len() > 0 {
            let count = self.discard_commits();
            tracing::warn!("Frame ended with {} unpushed commit(s); rolled back", count);
        }
    }

    /// Close on a terminal status. Returns whether the session is still open.
    pub fn apply_status(&mut self, status: ToolStatus) -> bool {
        match status {
            ToolStatus::Running | ToolStatus::Pass => {}
            ToolStatus::Confirm => self.close(false),
            ToolStatus::Cancel | ToolStatus::Error => self.close(true),
        }
        self.is_open()
    }

    // ── Highlight ─────────────────────────────────────────────

    /// Queue highlight geometry for elements of a tracked object
    pub fn highlight(&mut self, object: &str, elements: &ElementSet, style: &HighlightStyle) -> bool {
        let Some(session) = self.sessions.iter().find(|s| s.object() == object) else {
            return false;
        };
        self.highlight.build_batch(session, elements, style)
    }

    /// Queue the element of a hit in the configured style for its kind
    pub fn highlight_hit(&mut self, hit: &HitInfo) -> bool {
        if !self.hit_is_current(hit) {
            return false;
        }
        let style = match hit.kind {
            ElementKind::Vertex => self.settings.highlight.vertex.clone(),
            ElementKind::Edge => self.settings.highlight.edge.clone(),
            ElementKind::Face => self.settings.highlight.face.clone(),
        };
        self.highlight(&hit.object, &ElementSet::single(hit.kind, hit.index), &style)
    }

    /// Hand this frame's highlight batches to the renderer
    pub fn draw(&self, sink: &mut impl DrawSink) -> usize {
        if !self.is_open() {
            return 0;
        }
        self.highlight.draw(sink)
    }

    pub fn highlight_batches(&self) -> usize {
        self.highlight.batches().len()
    }

    // ── Close ─────────────────────────────────────────────────

    /// End the session.
    ///
    /// With `revert` every tracked object gets back the mesh it had when
    /// tracking began; otherwise committed edits stay. Topology, ray
    /// structures, undo history and the draw handler are released either way.
    /// Failures are logged and never stop the shutdown.
    pub fn close(&mut self, revert: bool) {
        if !self.is_open() {
            return;
        }
        self.highlight.clear_batches();
        let unpushed = self.undo.take_staged();
        if !unpushed.is_empty() && !revert {
            tracing::debug!("Keeping {} unpushed commit(s) on close", unpushed.len());
        }

        let mut failures = 0;
        if revert {
            let host = &self.host;
            let changed: Vec<usize> = self
                .sessions
                .iter()
                .enumerate()
                .filter(|(_, s)| {
                    host.read_mesh(s.object(), s.source())
                        .map_or(true, |mesh| &mesh != s.snapshot().mesh())
                })
                .map(|(i, _)| i)
                .collect();
            for i in changed {
                let session = &self.sessions[i];
                if let Err(e) = session.snapshot().restore(&mut self.host) {
                    let e = SessionError::CleanupFailure(format!(
                        "restoring `{}`: {}",
                        session.object(),
                        e
                    ));
                    tracing::error!("{}", e);
                    failures += 1;
                }
            }
        }

        let objects = self.sessions.len();
        self.sessions.clear();
        self.tracked.clear();
        self.specified = None;
        self.undo.clear();

        if let Some(handle) = self.draw_handle.take() {
            if !self.registry.unregister_draw(handle) {
                let e = SessionError::CleanupFailure(format!("draw handle {handle:?} was not registered"));
                tracing::error!("{}", e);
            }
        }
        self.state = SessionState::Closed;
        tracing::info!(
            "Closed edit session of {} object(s){}{}",
            objects,
            if revert { ", reverted" } else { "" },
            if failures > 0 { format!(", {failures} restore failure(s)") } else { String::new() }
        );
    }
}

impl<H: Host> Drop for SessionController<'_, H> {
    fn drop(&mut self) {
        if self.is_open() {
            tracing::debug!("Edit session dropped while open; reverting");
            self.close(true);
        }
    }
}

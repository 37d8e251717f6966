//! Bounded multi-object undo history.
//!
//! Each tracked object keeps its own stack of committed meshes; a shared log of
//! step ordinals ties the entries of one `push` together so that a step which
//! touched several objects is undone as a unit. Entries are staged first and
//! only become undoable once pushed.

use std::collections::{BTreeMap, VecDeque};

use shared::{ObjectId, PersistedMesh};

/// A mesh state of one object, recorded before a commit replaced it.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub object: ObjectId,
    pub mesh: PersistedMesh,
    /// Step this entry belongs to; 0 while staged
    pub ordinal: u64,
}

#[derive(Debug, Clone)]
pub struct UndoPool {
    depth: usize,
    stacks: BTreeMap<ObjectId, VecDeque<UndoEntry>>,
    /// Ordinals of pushed steps, oldest first
    log: VecDeque<u64>,
    staged: Vec<UndoEntry>,
    redo: Vec<Vec<UndoEntry>>,
    next_ordinal: u64,
}

impl UndoPool {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            stacks: BTreeMap::new(),
            log: VecDeque::new(),
            staged: Vec::new(),
            redo: Vec::new(),
            next_ordinal: 1,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Stage the state `object` had before the pending step.
    /// Only the first staging per object and step is kept.
    pub fn stage(&mut self, object: &str, mesh: PersistedMesh) -> bool {
        if self.is_staged(object) {
            return false;
        }
        self.staged.push(UndoEntry {
            object: object.to_string(),
            mesh,
            ordinal: 0,
        });
        true
    }

    pub fn is_staged(&self, object: &str) -> bool {
        self.staged.iter().any(|e| e.object == object)
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    pub fn take_staged(&mut self) -> Vec<UndoEntry> {
        std::mem::take(&mut self.staged)
    }

    /// Commit the staged entries as one step and clear the redo history.
    /// Returns false when nothing was staged.
    pub fn push(&mut self) -> bool {
        let staged = self.take_staged();
        if staged.is_empty() {
            return false;
        }
        self.redo.clear();
        self.record_step(staged)
    }

    /// Append `entries` as one step, evicting the oldest step past the depth.
    pub fn record_step(&mut self, entries: Vec<UndoEntry>) -> bool {
        if entries.is_empty() {
            return false;
        }
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        for mut entry in entries {
            entry.ordinal = ordinal;
            self.stacks
                .entry(entry.object.clone())
                .or_default()
                .push_back(entry);
        }
        self.log.push_back(ordinal);

        while self.log.len() > self.depth {
            let Some(oldest) = self.log.pop_front() else {
                break;
            };
            for stack in self.stacks.values_mut() {
                while stack.front().is_some_and(|e| e.ordinal == oldest) {
                    stack.pop_front();
                }
            }
            self.stacks.retain(|_, stack| !stack.is_empty());
            tracing::debug!("Evicted undo step {}", oldest);
        }
        true
    }

    /// Remove and return every entry of the most recent step
    pub fn pop_step(&mut self) -> Option<Vec<UndoEntry>> {
        let ordinal = self.log.pop_back()?;
        let mut entries = Vec::new();
        for stack in self.stacks.values_mut() {
            while stack.back().is_some_and(|e| e.ordinal == ordinal) {
                entries.extend(stack.pop_back());
            }
        }
        self.stacks.retain(|_, stack| !stack.is_empty());
        Some(entries)
    }

    /// Remember the states an undo replaced
    pub fn push_redo(&mut self, entries: Vec<UndoEntry>) {
        if !entries.is_empty() {
            self.redo.push(entries);
        }
    }

    pub fn pop_redo(&mut self) -> Option<Vec<UndoEntry>> {
        self.redo.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.log.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable steps
    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Entries held for one object
    pub fn object_depth(&self, object: &str) -> usize {
        self.stacks.get(object).map_or(0, VecDeque::len)
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
        self.log.clear();
        self.staged.clear();
        self.redo.clear();
    }
}

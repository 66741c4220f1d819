//! Command journal: the ordered record of every dataset mutation.
//!
//! Each edit operation records exactly one [`Mutation`] per change, in the
//! order performed, so the host can undo a whole session as one sequence.
//! [`CommandJournal`] is the in-memory journal; hosts with their own undo
//! stack implement [`Journal`] as an adapter.

use std::fmt;

use crate::dataset::Dataset;
use crate::model::{Node, Way};
use crate::DatasetResult;

/// One reversible change to a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// A node created in this session.
    AddNode(Node),
    /// A way created in this session (the second half of a split).
    AddWay(Way),
    /// A way replaced by a new value with the same id (node list or tags).
    ChangeWay { before: Way, after: Way },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::AddNode(n) => write!(f, "add node {} at {}", n.id, n.coord),
            Mutation::AddWay(w) => write!(f, "add way {} ({} nodes)", w.id, w.nodes.len()),
            Mutation::ChangeWay { before, after } if before.tags != after.tags => {
                write!(f, "retag way {}", after.id)
            }
            Mutation::ChangeWay { before, after } => write!(
                f,
                "change way {} ({} -> {} nodes)",
                after.id,
                before.nodes.len(),
                after.nodes.len()
            ),
        }
    }
}

/// Sink for dataset mutations.
pub trait Journal {
    fn record(&mut self, mutation: Mutation);
}

// ── CommandJournal ────────────────────────────────────────────────────────────

/// Stores recorded mutations in order and can roll them back.
#[derive(Debug, Default)]
pub struct CommandJournal {
    entries: Vec<Mutation>,
}

impl CommandJournal {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only view of all entries, oldest first.
    pub fn entries(&self) -> &[Mutation] {
        &self.entries
    }

    /// Undo every recorded mutation, newest first, and clear the journal.
    ///
    /// Returns the number of mutations undone.  Clears the selection, since
    /// it may reference primitives that no longer exist.
    ///
    /// # Errors
    ///
    /// [`DatasetError::WayNotFound`](crate::DatasetError::WayNotFound) if a
    /// changed way was deleted behind the journal's back.  Entries already
    /// undone stay undone; the failing entry and everything older stay in
    /// the journal.
    pub fn undo_all<D: Dataset>(&mut self, dataset: &mut D) -> DatasetResult<usize> {
        let mut undone = 0;
        while let Some(mutation) = self.entries.last() {
            match mutation {
                Mutation::AddNode(node) => {
                    dataset.remove_node(node.id);
                }
                Mutation::AddWay(way) => {
                    dataset.remove_way(way.id);
                }
                Mutation::ChangeWay { before, .. } => {
                    dataset.replace_way(before.clone())?;
                }
            }
            self.entries.pop();
            undone += 1;
        }
        dataset.select_nodes(&[]);
        log::debug!("undid {undone} mutations");
        Ok(undone)
    }
}

impl Journal for CommandJournal {
    fn record(&mut self, mutation: Mutation) {
        log::trace!("journal: {mutation}");
        self.entries.push(mutation);
    }
}

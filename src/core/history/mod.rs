use crate::core::event::OperationListener;
use crate::core::prelude::*;
use crate::util::vm_err;

use std::collections::BTreeSet;
use std::fmt;
use time::OffsetDateTime;

pub mod csv_file;
pub mod entry;
pub mod storage;

pub use entry::{operation_display_name, type_label, HistoryEntry};
pub use storage::{FileStorage, MemoryStorage, Storage};

/// Asked before the whole history is deleted.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

pub const CLEAR_PROMPT: &str = "¿Estás seguro de que quieres eliminar todo el historial?";

/// Which entries to show. `None` means "all".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryFilter {
    pub kind: Option<OperationKind>,
    pub operation: Option<String>,
    pub search: String,
}

impl HistoryFilter {
    /// Builds a filter from the values of the filter controls, where `"all"` disables a filter.
    pub fn from_controls(kind: &str, operation: &str, search: &str) -> Result<Self> {
        Ok(Self {
            kind: match kind {
                "all" | "" => None,
                kind => Some(kind.parse()?),
            },
            operation: match operation {
                "all" | "" => None,
                operation => Some(operation.to_string()),
            },
            search: search.to_string(),
        })
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if self.kind.is_some_and(|kind| kind != entry.kind) {
            return false;
        }
        if self
            .operation
            .as_ref()
            .is_some_and(|operation| *operation != entry.operation)
        {
            return false;
        }
        self.search.is_empty() || entry.search_text().contains(&self.search.to_lowercase())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    /// Size of the stored JSON.
    pub size_kb: f64,
}

impl fmt::Display for HistoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Total: {} operaciones | Tamaño: {:.2} KB", self.total, self.size_kb)
    }
}

/// The operation log, newest first. Sole writer of the history in storage: every mutation is
/// saved immediately.
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    filter: HistoryFilter,
    storage: Box<dyn Storage>,
}

impl HistoryStore {
    /// Loads the history from `storage`. Missing or unreadable history gives an empty log.
    pub fn open(storage: Box<dyn Storage>) -> Self {
        let entries = match storage.load(HISTORY_STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<HistoryEntry>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    error!("stored history is corrupt, starting empty: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                error!("could not load history, starting empty: {e:#}");
                Vec::new()
            }
        };
        info!("loaded {} history entries", entries.len());
        let mut rv = Self {
            entries,
            filter: HistoryFilter::default(),
            storage,
        };
        if rv.rekey_legacy_ids() > 0 {
            rv.persist();
        }
        rv
    }

    /// Gives a fresh id to every entry whose id is 0 (not representable) or repeats an earlier
    /// one. Returns how many entries changed.
    fn rekey_legacy_ids(&mut self) -> usize {
        let mut seen = BTreeSet::new();
        let mut stale = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.id == 0 || !seen.insert(entry.id) {
                stale.push(i);
            }
        }
        for &i in &stale {
            self.entries[i].id = self.fresh_id();
        }
        if !stale.is_empty() {
            info!("assigned new ids to {} history entries", stale.len());
        }
        stale.len()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    fn persist(&mut self) {
        let result = self
            .to_json()
            .and_then(|json| self.storage.save(HISTORY_STORAGE_KEY, &json))
            .context("could not save history");
        vm_err::log_err_and_ignore(result);
    }

    fn fresh_id(&self) -> u64 {
        loop {
            let id = rand::random::<u64>();
            if id != 0 && self.find(id).is_none() {
                return id;
            }
        }
    }

    pub fn record(&mut self, event: &OperationEvent) -> &HistoryEntry {
        let entry = HistoryEntry::from_event(self.fresh_id(), OffsetDateTime::now_utc(), event);
        self.entries.insert(0, entry);
        self.persist();
        &self.entries[0]
    }

    pub fn find(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Returns whether an entry was removed. Unknown ids are ignored.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Empties the log if `confirm` agrees. Returns whether it did.
    pub fn clear(&mut self, confirm: &mut dyn Confirm) -> bool {
        if !confirm.confirm(CLEAR_PROMPT) {
            return false;
        }
        self.entries.clear();
        self.persist();
        info!("history cleared");
        true
    }

    pub fn filter(&self, filter: &HistoryFilter) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .collect()
    }

    pub fn current_filter(&self) -> &HistoryFilter {
        &self.filter
    }
    pub fn set_filter(&mut self, filter: HistoryFilter) {
        self.filter = filter;
    }
    pub fn set_type_filter(&mut self, kind: Option<OperationKind>) {
        self.filter.kind = kind;
    }
    pub fn set_operation_filter(&mut self, operation: Option<String>) {
        self.filter.operation = operation;
    }
    pub fn set_search_term(&mut self, search: &str) {
        self.filter.search = search.to_string();
    }

    /// The entries matching the current filter.
    pub fn filtered(&self) -> Vec<&HistoryEntry> {
        self.filter(&self.filter)
    }

    pub fn export_csv(&self) -> Result<String> {
        csv_file::export(&self.entries)
    }

    /// Prepends every row of `contents`, in file order, with fresh ids. If any row is malformed
    /// nothing is imported. Returns how many entries were added.
    pub fn import_csv(&mut self, contents: &str) -> Result<usize> {
        let mut imported = csv_file::import(contents).context("could not import history")?;
        for i in 0..imported.len() {
            let mut id = self.fresh_id();
            while imported[..i].iter().any(|entry| entry.id == id) {
                id = self.fresh_id();
            }
            imported[i].id = id;
        }
        let count = imported.len();
        imported.append(&mut self.entries);
        self.entries = imported;
        self.persist();
        info!("imported {count} history entries");
        Ok(count)
    }

    pub fn stats(&self) -> HistoryStats {
        let bytes = vm_err::log_and_ok(self.to_json()).map_or(0, |json| json.len());
        #[allow(clippy::cast_precision_loss)]
        let size_kb = bytes as f64 / 1024.0;
        HistoryStats {
            total: self.entries.len(),
            size_kb,
        }
    }

    /// The operands of a vector entry, for loading back into the calculator and the view.
    /// `None` for matrix entries and unknown ids.
    pub fn reuse(&self, id: u64) -> Option<VectorUpdate> {
        let entry = self.find(id)?;
        if entry.kind != OperationKind::Vector {
            info!("reusing matrix entries is not supported");
            return None;
        }
        Some(VectorUpdate {
            a: entry.input_a.as_vector().unwrap_or_default(),
            b: entry
                .input_b
                .and_then(|value| value.as_vector())
                .unwrap_or_default(),
            result: Some(entry.op_result()),
        })
    }

    /// The formatted result, as copied to the clipboard.
    pub fn copy_text(&self, id: u64) -> Option<String> {
        self.find(id).map(HistoryEntry::formatted_result)
    }
}

impl OperationListener for HistoryStore {
    fn on_operation(&mut self, event: &OperationEvent) {
        self.record(event);
    }
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("entries", &self.entries.len())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

//! In-memory catalog, standing in for the persistence collaborator.
//!
//! The core pipelines only need a narrow query/save surface: fetch works
//! by id, ISWC or a society's remote id; bulk-fetch controlled writer
//! rows for a set of works; lookup-or-create writers by natural key; and
//! apply acknowledgements atomically. The [`Catalog`] provides exactly
//! that surface over plain maps and can be snapshotted to and from JSON,
//! which is what the CLI operates on.
//!
//! Mutating operations follow the batch semantics of the error taxonomy:
//! a conflict (diverging IPI on lookup-or-create, conflicting ISWC on
//! import) fails the operation before anything is applied.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::models::rules::WriterLookup;
use crate::models::{Work, WorkAcknowledgement, Writer, WriterInWork};

// =============================================================================
// Catalog
// =============================================================================

/// The full publishing catalog: works, writers and their links.
///
/// Works own their writer rows, titles, recordings and acknowledgements;
/// writers are referenced by id and never deleted implicitly.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    works: BTreeMap<u64, Work>,
    #[serde(default)]
    writers: BTreeMap<u64, Writer>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Works
    // -------------------------------------------------------------------------

    pub fn add_work(&mut self, work: Work) {
        self.works.insert(work.id, work);
    }

    pub fn work(&self, id: u64) -> Option<&Work> {
        self.works.get(&id)
    }

    pub fn work_mut(&mut self, id: u64) -> Option<&mut Work> {
        self.works.get_mut(&id)
    }

    pub fn works(&self) -> impl Iterator<Item = &Work> {
        self.works.values()
    }

    pub fn work_count(&self) -> usize {
        self.works.len()
    }

    /// Find a work by its canonical ISWC.
    pub fn work_by_iswc(&self, iswc: &str) -> Option<&Work> {
        self.works
            .values()
            .find(|w| w.iswc.as_deref() == Some(iswc))
    }

    /// Find a work by a society's remote id, as recorded by a previous
    /// acknowledgement import.
    pub fn work_by_remote_id(&self, society_code: &str, remote_id: &str) -> Option<&Work> {
        self.works
            .values()
            .find(|w| w.acknowledgement(society_code, remote_id).is_some())
    }

    // -------------------------------------------------------------------------
    // Writers
    // -------------------------------------------------------------------------

    pub fn add_writer(&mut self, writer: Writer) {
        self.writers.insert(writer.id, writer);
    }

    pub fn get_writer(&self, id: u64) -> Option<&Writer> {
        self.writers.get(&id)
    }

    pub fn writers(&self) -> impl Iterator<Item = &Writer> {
        self.writers.values()
    }

    /// Find a writer by natural key (name + IPI name number), creating it
    /// when absent. A writer with a matching name but a different IPI or
    /// society affiliation is a conflict, fatal to the enclosing batch.
    pub fn lookup_or_create_writer(
        &mut self,
        name: &crate::models::PersonName,
        ipi_name: Option<&str>,
        pr_society: Option<&str>,
    ) -> StoreResult<u64> {
        if let Some(existing) = self.writers.values().find(|w| &w.name == name) {
            if let (Some(given), Some(stored)) = (ipi_name, existing.ipi.ipi_name.as_deref()) {
                if given != stored {
                    return Err(StoreError::WriterConflict {
                        name: existing.name.last_name.clone(),
                        field: "IPI name number",
                        given: given.into(),
                        existing: stored.into(),
                    });
                }
            }
            if let (Some(given), Some(stored)) = (pr_society, existing.ipi.pr_society.as_deref()) {
                if given != stored {
                    return Err(StoreError::WriterConflict {
                        name: existing.name.last_name.clone(),
                        field: "society",
                        given: given.into(),
                        existing: stored.into(),
                    });
                }
            }
            return Ok(existing.id);
        }

        let id = self.writers.keys().max().copied().unwrap_or(0) + 1;
        self.writers.insert(
            id,
            Writer {
                id,
                name: name.clone(),
                ipi: crate::models::IpiIdentity {
                    ipi_name: ipi_name.map(String::from),
                    ipi_base: None,
                    pr_society: pr_society.map(String::from),
                },
                isni: None,
                generally_controlled: false,
                saan: None,
                publisher_fee: None,
            },
        );
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Bulk queries for the royalty engine
    // -------------------------------------------------------------------------

    /// Resolve a batch of external identifiers to work ids in one pass.
    ///
    /// `source` selects which index is consulted; unresolvable keys are
    /// simply absent from the returned map.
    pub fn resolve_works(
        &self,
        keys: &[String],
        source: &crate::royalty::WorkIdSource,
    ) -> HashMap<String, u64> {
        use crate::royalty::WorkIdSource;

        let mut resolved = HashMap::new();
        match source {
            WorkIdSource::WorkId { publisher_code } => {
                for key in keys {
                    let digits = key
                        .trim()
                        .strip_prefix(publisher_code.as_str())
                        .unwrap_or(key.trim());
                    if let Ok(id) = digits.trim_start_matches('0').parse::<u64>() {
                        if self.works.contains_key(&id) {
                            resolved.insert(key.clone(), id);
                        }
                    }
                }
            }
            WorkIdSource::Iswc => {
                let by_iswc: HashMap<&str, u64> = self
                    .works
                    .values()
                    .filter_map(|w| w.iswc.as_deref().map(|i| (i, w.id)))
                    .collect();
                for key in keys {
                    if let Ok(normalized) = crate::validation::validate_iswc(key) {
                        if let Some(&id) = by_iswc.get(normalized.as_str()) {
                            resolved.insert(key.clone(), id);
                        }
                    }
                }
            }
            WorkIdSource::SocietyWorkId { society_code } => {
                let code = format!("{:0>3}", society_code.trim());
                let by_remote: HashMap<&str, u64> = self
                    .works
                    .values()
                    .flat_map(|w| {
                        w.acknowledgements
                            .iter()
                            .filter(|a| format!("{:0>3}", a.society_code) == code)
                            .map(move |a| (a.remote_work_id.as_str(), w.id))
                    })
                    .collect();
                for key in keys {
                    if let Some(&id) = by_remote.get(key.trim()) {
                        resolved.insert(key.clone(), id);
                    }
                }
            }
        }
        resolved
    }

    /// Bulk-fetch controlled writer rows (with resolved writers) for a
    /// set of works. One call per royalty run, never one per row.
    pub fn controlled_rows(
        &self,
        work_ids: &[u64],
    ) -> HashMap<u64, Vec<(WriterInWork, Writer)>> {
        let mut map = HashMap::new();
        for &id in work_ids {
            let Some(work) = self.works.get(&id) else {
                continue;
            };
            let rows: Vec<(WriterInWork, Writer)> = work
                .writers
                .iter()
                .filter(|wiw| wiw.controlled)
                .filter_map(|wiw| {
                    let writer = wiw.writer_id.and_then(|wid| self.writers.get(&wid))?;
                    Some((wiw.clone(), writer.clone()))
                })
                .collect();
            map.insert(id, rows);
        }
        map
    }

    // -------------------------------------------------------------------------
    // Acknowledgements
    // -------------------------------------------------------------------------

    /// Whether an acknowledgement with this uniqueness key already exists
    /// anywhere in the catalog.
    pub fn has_acknowledgement(&self, society_code: &str, remote_id: &str) -> bool {
        self.works
            .values()
            .any(|w| w.acknowledgement(society_code, remote_id).is_some())
    }

    /// Attach an acknowledgement to a work.
    pub fn add_acknowledgement(
        &mut self,
        work_id: u64,
        ack: WorkAcknowledgement,
    ) -> StoreResult<()> {
        let work = self
            .works
            .get_mut(&work_id)
            .ok_or(StoreError::WorkNotFound(work_id))?;
        work.acknowledgements.push(ack);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// Load a catalog from a JSON snapshot file.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the catalog to a JSON snapshot file.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl WriterLookup for Catalog {
    fn writer(&self, id: u64) -> Option<&Writer> {
        self.writers.get(&id)
    }
}

//! In-memory person table with an append-only details file.

use crate::StoreError;
use rollcall_core::{Person, PersonId};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Registered identities keyed by ID.
///
/// The table owns every `Person`; `order` is a derived view that preserves
/// registration order for iteration, not a second owning collection.
pub struct PersonRegistry {
    people: HashMap<PersonId, Person>,
    order: Vec<PersonId>,
    details_path: PathBuf,
}

impl PersonRegistry {
    pub fn new(details_path: PathBuf) -> Self {
        Self {
            people: HashMap::new(),
            order: Vec::new(),
            details_path,
        }
    }

    /// Add a person and append their details line.
    ///
    /// A duplicate ID silently overwrites the existing entry (known weak
    /// point of this design — surfaced as a warning, not rejected) and keeps
    /// its original position in the iteration order. The details line is
    /// appended either way, so re-registration leaves two lines on disk.
    ///
    /// On an append failure the in-memory entry is still registered; the
    /// error tells the caller the persisted record was lost.
    pub fn register(&mut self, person: Person) -> Result<(), StoreError> {
        let id = person.id;
        let line = person.to_string();

        if self.people.insert(id, person).is_some() {
            tracing::warn!(id, "duplicate ID: overwriting existing registry entry");
        } else {
            self.order.push(id);
        }

        self.append_details_line(&line)
    }

    /// Pure in-memory lookup, no I/O.
    pub fn lookup(&self, id: PersonId) -> Option<&Person> {
        self.people.get(&id)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Registered persons in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.order.iter().filter_map(|id| self.people.get(id))
    }

    fn append_details_line(&self, line: &str) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.details_path)
            .map_err(|source| StoreError::DetailsAppend {
                path: self.details_path.clone(),
                source,
            })?;

        writeln!(file, "{line}").map_err(|source| StoreError::DetailsAppend {
            path: self.details_path.clone(),
            source,
        })
    }
}

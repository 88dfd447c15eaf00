//! One record-entry session:
//!
//! ```text
//! Idle -> Searching -> Selected -> Submitting -> Closed
//!   ^         |  ^          |           |
//!   |         +--+          |           +-> Selected (save failed, retry)
//!   +------- cancel --------+-----------+
//! ```
//!
//! Searches are numbered. Only the result of the latest search is applied; an older
//! one completing late is dropped. This is the in-process flow; over HTTP the same
//! numbering is kept per user by `catalog::services::SearchSequencer`.

use thiserror::Error;

use super::assembler::{assemble, EntryDetails, Selection};
use super::repo_types::Record;
use super::services::Saved;
use crate::catalog::repo_types::Product;

#[derive(Debug, Clone, PartialEq)]
pub enum EntryState {
    Idle,
    Searching { seq: u64, query: String },
    Selected(Selection),
    Submitting(Selection),
    Closed(Record),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("pick a drink or type a name first")]
    NothingSelected,
    #[error("drink name must not be empty")]
    EmptyName,
    #[error("a save is already in progress")]
    AlreadySubmitting,
    #[error("entry already saved")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
}

#[derive(Debug)]
pub struct EntrySession {
    state: EntryState,
    latest_seq: u64,
    results: Vec<Product>,
    existing: Option<Record>,
}

impl Default for EntrySession {
    fn default() -> Self {
        Self::new()
    }
}

impl EntrySession {
    pub fn new() -> Self {
        Self {
            state: EntryState::Idle,
            latest_seq: 0,
            results: Vec::new(),
            existing: None,
        }
    }

    /// Edit mode: the assembled record keeps `existing`'s id and creation date.
    pub fn editing(existing: Record) -> Self {
        Self {
            existing: Some(existing),
            ..Self::new()
        }
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    pub fn results(&self) -> &[Product] {
        &self.results
    }

    pub fn begin_search(&mut self, query: &str) -> Result<SearchTicket, SessionError> {
        self.ensure_open()?;
        self.latest_seq += 1;
        self.state = EntryState::Searching {
            seq: self.latest_seq,
            query: query.to_string(),
        };
        Ok(SearchTicket {
            seq: self.latest_seq,
        })
    }

    /// Returns false and leaves state untouched when a newer search superseded `ticket`.
    pub fn complete_search(&mut self, ticket: SearchTicket, results: Vec<Product>) -> bool {
        if ticket.seq != self.latest_seq || !matches!(self.state, EntryState::Searching { .. }) {
            return false;
        }
        self.results = results;
        true
    }

    pub fn select(&mut self, selection: Selection) -> Result<(), SessionError> {
        self.ensure_open()?;
        if let Selection::Custom(name) = &selection {
            if name.trim().is_empty() {
                return Err(SessionError::EmptyName);
            }
        }
        self.state = EntryState::Selected(selection);
        Ok(())
    }

    /// Assembles the record to persist and moves to `Submitting`.
    pub fn submit(&mut self, details: &EntryDetails) -> Result<Record, SessionError> {
        let selection = match &self.state {
            EntryState::Selected(s) => s.clone(),
            EntryState::Submitting(_) => return Err(SessionError::AlreadySubmitting),
            EntryState::Closed(_) => return Err(SessionError::Closed),
            EntryState::Idle | EntryState::Searching { .. } => {
                return Err(SessionError::NothingSelected)
            }
        };
        let record = assemble(&selection, details, self.existing.as_ref());
        self.state = EntryState::Submitting(selection);
        Ok(record)
    }

    /// Closes on success; on failure returns to `Selected` so the user can retry.
    pub fn finish<E>(&mut self, outcome: &Result<Saved, E>) {
        let EntryState::Submitting(selection) = &self.state else {
            return;
        };
        self.state = match outcome {
            Ok(saved) => EntryState::Closed(saved.record.clone()),
            Err(_) => EntryState::Selected(selection.clone()),
        };
    }

    pub fn cancel(&mut self) {
        if !matches!(self.state, EntryState::Closed(_)) {
            self.state = EntryState::Idle;
            self.results.clear();
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        match self.state {
            EntryState::Closed(_) => Err(SessionError::Closed),
            EntryState::Submitting(_) => Err(SessionError::AlreadySubmitting),
            _ => Ok(()),
        }
    }
}

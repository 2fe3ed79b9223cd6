//! In-memory candidate store.

use std::sync::{Arc, RwLock};

use crate::schema::Candidate;

/// Candidates in upload order, shared across handlers.
#[derive(Debug, Clone, Default)]
pub struct CandidateStore {
    inner: Arc<RwLock<Vec<Candidate>>>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a candidate, returns its id.
    pub fn insert(&self, candidate: Candidate) -> String {
        let id = candidate.id.clone();
        let mut store = self.inner.write().unwrap();
        tracing::debug!("CandidateStore: stored '{}' ({})", id, candidate.filename);
        store.push(candidate);
        id
    }

    pub fn get(&self, id: &str) -> Option<Candidate> {
        let store = self.inner.read().unwrap();
        store.iter().find(|c| c.id == id).cloned()
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Candidate> {
        let store = self.inner.read().unwrap();
        store.iter().rev().cloned().collect()
    }

    /// Upload order.
    pub fn all(&self) -> Vec<Candidate> {
        self.inner.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CanonicalRecord, Strategy};

    fn candidate(filename: &str) -> Candidate {
        Candidate::new(
            filename.to_string(),
            String::new(),
            CanonicalRecord::default(),
            Strategy::Pattern,
        )
    }

    #[test]
    fn test_insert_and_get() {
        let store = CandidateStore::new();
        let id = store.insert(candidate("a.pdf"));

        assert_eq!(store.get(&id).unwrap().filename, "a.pdf");
        assert!(store.get("cand_missing").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_list_newest_first() {
        let store = CandidateStore::new();
        store.insert(candidate("first.pdf"));
        store.insert(candidate("second.png"));

        let listed: Vec<_> = store.list().into_iter().map(|c| c.filename).collect();
        assert_eq!(listed, vec!["second.png", "first.pdf"]);

        let all: Vec<_> = store.all().into_iter().map(|c| c.filename).collect();
        assert_eq!(all, vec!["first.pdf", "second.png"]);
    }

    #[test]
    fn test_clones_share_state() {
        let store = CandidateStore::new();
        let handle = store.clone();
        handle.insert(candidate("shared.docx"));
        assert_eq!(store.len(), 1);
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dmed::models::{Cpf, HolderRecord};
use crate::dmed::parser::{ParseOutcome, ParseWarning};

/// The result of processing one uploaded file.
///
/// Holders are immutable once the session exists; search and declaration
/// rendering only read them.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub holders: Vec<HolderRecord>,
    pub warnings: Vec<ParseWarning>,
}

impl Session {
    pub fn new(file_name: impl Into<String>, outcome: ParseOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            created_at: Utc::now(),
            holders: outcome.holders,
            warnings: outcome.warnings,
        }
    }

    /// Looks a holder up by CPF, returning it with its position in the file.
    ///
    /// A file may repeat a CPF across `TOP` records. `index` (as reported by
    /// search) selects one of them; without it the first one wins.
    pub fn find_holder(&self, cpf: &Cpf, index: Option<usize>) -> Option<(usize, &HolderRecord)> {
        match index {
            Some(i) => self
                .holders
                .get(i)
                .filter(|h| h.cpf() == cpf)
                .map(|h| (i, h)),
            None => self.holders.iter().enumerate().find(|(_, h)| h.cpf() == cpf),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            file_name: self.file_name.clone(),
            created_at: self.created_at,
            holder_count: self.holders.len(),
            dependent_count: self.holders.iter().map(|h| h.dependents().len()).sum(),
            warnings: self.warnings.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub holder_count: usize,
    pub dependent_count: usize,
    pub warnings: Vec<ParseWarning>,
}

/// Holds at most one session: the last successfully processed file.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Arc<Session>>>>,
}

impl SessionStore {
    /// Returns the current session, if any. The lock is released on return.
    pub async fn current(&self) -> Option<Arc<Session>> {
        self.inner.read().await.clone()
    }

    pub async fn replace(&self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        *self.inner.write().await = Some(session.clone());
        session
    }

    /// Discards the current session. Called at the start of every processing run.
    pub async fn clear(&self) {
        self.inner.write().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dmed::parser::parse_dmed;

    #[tokio::test]
    async fn test_store_starts_empty() {
        let store = SessionStore::default();
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_replace_then_clear() {
        let store = SessionStore::default();
        let outcome = parse_dmed("TOP|11122233344|MARIA|100|");
        let session = store.replace(Session::new("dmed.txt", outcome)).await;

        let current = store.current().await.expect("session stored");
        assert_eq!(current.id, session.id);
        assert_eq!(current.summary().holder_count, 1);

        store.clear().await;
        assert!(store.current().await.is_none());
    }

    #[test]
    fn test_find_holder_and_summary_counts() {
        let outcome = parse_dmed(
            "TOP|11122233344|MARIA|100|\n\
             DTOP|55566677788|x|JOAO|y|50|\n\
             TOP|99988877766|ANA|300|\n\
             TOP|bad|X|1|",
        );
        let session = Session::new("dmed.txt", outcome);
        let summary = session.summary();
        assert_eq!(summary.holder_count, 2);
        assert_eq!(summary.dependent_count, 1);
        assert_eq!(summary.warnings.len(), 1);

        let cpf = Cpf::parse("99988877766").unwrap();
        assert_eq!(
            session.find_holder(&cpf, None).map(|(i, h)| (i, h.name())),
            Some((1, "ANA"))
        );
        let missing = Cpf::parse("00000000000").unwrap();
        assert!(session.find_holder(&missing, None).is_none());
    }

    #[test]
    fn test_find_holder_by_index_tells_repeated_cpfs_apart() {
        let outcome = parse_dmed(
            "TOP|11111111111|PRIMEIRA|100|\n\
             TOP|22222222222|OUTRA|200|\n\
             TOP|11111111111|SEGUNDA|300|",
        );
        let session = Session::new("dmed.txt", outcome);
        let cpf = Cpf::parse("11111111111").unwrap();

        let name_at = |index: Option<usize>| {
            session
                .find_holder(&cpf, index)
                .map(|(_, h)| h.name().to_string())
        };
        assert_eq!(name_at(None).as_deref(), Some("PRIMEIRA"));
        assert_eq!(name_at(Some(0)).as_deref(), Some("PRIMEIRA"));
        assert_eq!(name_at(Some(2)).as_deref(), Some("SEGUNDA"));
        // index pointing at a holder with another CPF, or past the end
        assert_eq!(name_at(Some(1)), None);
        assert_eq!(name_at(Some(9)), None);
    }
}

//! Import session - the review/selection state machine
//!
//! Holds the parsed candidates between duplicate detection and commit. The
//! session is pure state plus transition methods; it renders nothing and
//! talks to the outside world only through the injected ports. One session
//! is active at a time; every operation takes `&mut self`.

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Error, NewTransaction, ParsedTransaction, Result};
use crate::ports::{CategorizeItem, Categorizer, TransactionStore};

/// Category written when a committed candidate has none
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// User is reviewing candidates; all edit operations live here
    Reviewing,
    /// Categorizer call in flight; re-enters Reviewing when it resolves
    Categorizing,
    /// Commit loop running; not cancellable
    Committing,
    Committed,
    Cancelled,
}

/// A single candidate that failed to persist during commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitFailure {
    pub index: usize,
    pub description: String,
    pub error: String,
}

/// Outcome of a commit: "committed of attempted"
#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    pub attempted: usize,
    pub committed: usize,
    pub failures: Vec<CommitFailure>,
    pub batch_id: Uuid,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Review state for one imported statement
pub struct ImportSession {
    batch_id: Uuid,
    candidates: Vec<ParsedTransaction>,
    selected: BTreeSet<usize>,
    state: SessionState,
}

impl ImportSession {
    /// Start reviewing a batch of candidates.
    ///
    /// Everything except flagged duplicates starts selected.
    pub fn new(batch_id: Uuid, candidates: Vec<ParsedTransaction>) -> Self {
        let selected = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_flagged_duplicate())
            .map(|(i, _)| i)
            .collect();
        Self {
            batch_id,
            candidates,
            selected,
            state: SessionState::Reviewing,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn candidates(&self) -> &[ParsedTransaction] {
        &self.candidates
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected indices in list order
    pub fn selected_indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    fn ensure_reviewing(&self, operation: &str) -> Result<()> {
        if self.state != SessionState::Reviewing {
            return Err(Error::session(format!(
                "Cannot {} in state {:?}",
                operation, self.state
            )));
        }
        Ok(())
    }

    fn ensure_index(&self, index: usize) -> Result<()> {
        if index >= self.candidates.len() {
            return Err(Error::validation(format!(
                "Index {} out of range for {} candidates",
                index,
                self.candidates.len()
            )));
        }
        Ok(())
    }

    /// Flip one candidate's membership in the selection.
    ///
    /// Any index can be toggled regardless of confidence; including a
    /// flagged duplicate is an explicit user decision.
    pub fn toggle_select(&mut self, index: usize) -> Result<()> {
        self.ensure_reviewing("toggle selection")?;
        self.ensure_index(index)?;
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
        Ok(())
    }

    /// Select all, or clear when everything is already selected
    pub fn toggle_select_all(&mut self) -> Result<()> {
        self.ensure_reviewing("toggle selection")?;
        if self.selected.len() == self.candidates.len() {
            self.selected.clear();
        } else {
            self.selected = (0..self.candidates.len()).collect();
        }
        Ok(())
    }

    /// Edit one candidate's category in place; confidence is untouched
    pub fn update_category(&mut self, index: usize, category: &str) -> Result<()> {
        self.ensure_reviewing("edit category")?;
        self.ensure_index(index)?;
        let trimmed = category.trim();
        self.candidates[index].category = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        Ok(())
    }

    /// Send the full candidate list to the categorizer and replace all
    /// categories with its suggestions.
    ///
    /// Soft failure: if the call errors (or returns a misaligned list) the
    /// current categories stay untouched, the session re-enters Reviewing
    /// and the error is surfaced to the caller.
    pub async fn categorize_all(&mut self, categorizer: &dyn Categorizer) -> Result<()> {
        self.ensure_reviewing("categorize")?;
        self.state = SessionState::Categorizing;

        let items: Vec<CategorizeItem> = self
            .candidates
            .iter()
            .map(|c| CategorizeItem {
                description: c.description.clone(),
                amount: c.amount,
                kind: c.kind,
            })
            .collect();

        let outcome = categorizer.categorize(&items).await;
        self.state = SessionState::Reviewing;

        let suggestions = outcome?;
        if suggestions.len() != self.candidates.len() {
            return Err(Error::Categorization(format!(
                "Categorizer returned {} suggestions for {} candidates",
                suggestions.len(),
                self.candidates.len()
            )));
        }

        for (candidate, suggestion) in self.candidates.iter_mut().zip(suggestions) {
            if suggestion.category.trim().is_empty() {
                candidate.category = None;
                candidate.category_confidence = None;
            } else {
                candidate.category = Some(suggestion.category);
                candidate.category_confidence = Some(suggestion.confidence);
            }
        }
        Ok(())
    }

    /// Persist the selected candidates, one create call per item in list
    /// order. Failures are counted per item and never roll back or stop the
    /// rest of the batch. The session ends Committed even when some items
    /// failed; the report carries the "N of M" outcome.
    pub async fn commit(&mut self, store: &dyn TransactionStore) -> Result<CommitReport> {
        self.ensure_reviewing("commit")?;
        self.state = SessionState::Committing;

        let indices = self.selected_indices();
        let mut report = CommitReport {
            attempted: indices.len(),
            committed: 0,
            failures: Vec::new(),
            batch_id: self.batch_id,
        };

        for index in indices {
            let candidate = &self.candidates[index];
            let payload = NewTransaction {
                description: candidate.description.clone(),
                amount: candidate.amount,
                kind: candidate.kind,
                category: Some(
                    candidate
                        .category
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
                ),
                date: candidate.date,
                batch_id: Some(self.batch_id),
            };
            match store.create(payload).await {
                Ok(_) => report.committed += 1,
                Err(e) => report.failures.push(CommitFailure {
                    index,
                    description: candidate.description.clone(),
                    error: e.to_string(),
                }),
            }
        }

        self.state = SessionState::Committed;
        Ok(report)
    }

    /// Discard the session. Only possible before commit starts; a running
    /// commit always completes.
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_reviewing("cancel")?;
        self.state = SessionState::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::domain::{TransactionKind, DUPLICATE_CONFIDENCE};
    use crate::ports::CategorySuggestion;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    struct FixedCategorizer(Vec<CategorySuggestion>);

    #[async_trait]
    impl Categorizer for FixedCategorizer {
        async fn categorize(&self, _items: &[CategorizeItem]) -> Result<Vec<CategorySuggestion>> {
            Ok(self.0.clone())
        }
    }

    struct FailingCategorizer;

    #[async_trait]
    impl Categorizer for FailingCategorizer {
        async fn categorize(&self, _items: &[CategorizeItem]) -> Result<Vec<CategorySuggestion>> {
            Err(Error::Categorization("Service unavailable".to_string()))
        }
    }

    fn candidate(desc: &str, cents: i64, day: u32) -> ParsedTransaction {
        let (amount, kind) = TransactionKind::from_signed(Decimal::new(cents, 2));
        ParsedTransaction::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            Some(desc.to_string()),
            amount,
            kind,
        )
    }

    fn session_with_duplicate() -> ImportSession {
        let mut flagged = candidate("Uber Trip", -2490, 5);
        flagged.confidence = DUPLICATE_CONFIDENCE;
        let candidates = vec![
            candidate("Salary", 500000, 1),
            flagged,
            candidate("Netflix", -5590, 7),
        ];
        ImportSession::new(Uuid::new_v4(), candidates)
    }

    fn suggestion(category: &str) -> CategorySuggestion {
        CategorySuggestion {
            category: category.to_string(),
            confidence: 80,
        }
    }

    #[test]
    fn test_initial_selection_excludes_flagged_duplicates() {
        let session = session_with_duplicate();
        assert_eq!(session.state(), SessionState::Reviewing);
        assert_eq!(session.selected_indices(), vec![0, 2]);
    }

    #[test]
    fn test_toggle_select_flips_any_index() {
        let mut session = session_with_duplicate();

        // Duplicates can be selected on explicit user intent
        session.toggle_select(1).unwrap();
        assert_eq!(session.selected_indices(), vec![0, 1, 2]);

        session.toggle_select(1).unwrap();
        assert_eq!(session.selected_indices(), vec![0, 2]);

        assert!(session.toggle_select(99).is_err());
    }

    #[test]
    fn test_toggle_select_all_round_trip() {
        let mut session = session_with_duplicate();

        // Not everything is selected: select all
        session.toggle_select_all().unwrap();
        assert_eq!(session.selected_count(), 3);

        // Everything selected: clear
        session.toggle_select_all().unwrap();
        assert_eq!(session.selected_count(), 0);

        session.toggle_select_all().unwrap();
        assert_eq!(session.selected_count(), 3);
    }

    #[test]
    fn test_update_category_in_place() {
        let mut session = session_with_duplicate();
        let before = session.candidates()[0].confidence;

        session.update_category(0, "Income").unwrap();
        assert_eq!(session.candidates()[0].category.as_deref(), Some("Income"));
        assert_eq!(session.candidates()[0].confidence, before);

        session.update_category(0, "   ").unwrap();
        assert_eq!(session.candidates()[0].category, None);
    }

    #[tokio::test]
    async fn test_categorize_all_replaces_categories() {
        let mut session = session_with_duplicate();
        session.update_category(0, "Old").unwrap();

        let categorizer = FixedCategorizer(vec![
            suggestion("Income"),
            suggestion("Transport"),
            suggestion("Subscriptions"),
        ]);
        session.categorize_all(&categorizer).await.unwrap();

        assert_eq!(session.state(), SessionState::Reviewing);
        assert_eq!(session.candidates()[0].category.as_deref(), Some("Income"));
        assert_eq!(
            session.candidates()[2].category.as_deref(),
            Some("Subscriptions")
        );
        assert_eq!(session.candidates()[1].category_confidence, Some(80));
    }

    #[tokio::test]
    async fn test_categorize_failure_keeps_categories() {
        let mut session = session_with_duplicate();
        session.update_category(0, "Income").unwrap();

        let result = session.categorize_all(&FailingCategorizer).await;

        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Reviewing);
        assert_eq!(session.candidates()[0].category.as_deref(), Some("Income"));
    }

    #[tokio::test]
    async fn test_misaligned_categorizer_is_soft_failure() {
        let mut session = session_with_duplicate();
        let categorizer = FixedCategorizer(vec![suggestion("Income")]);

        let result = session.categorize_all(&categorizer).await;

        assert!(result.is_err());
        assert_eq!(session.state(), SessionState::Reviewing);
        assert_eq!(session.candidates()[0].category, None);
    }

    #[tokio::test]
    async fn test_commit_persists_selected_in_order() {
        let mut session = session_with_duplicate();
        let store = MemoryStore::new();

        let report = session.commit(&store).await.unwrap();

        assert_eq!(report.attempted, 2);
        assert_eq!(report.committed, 2);
        assert!(report.is_complete());
        assert_eq!(session.state(), SessionState::Committed);

        let stored = store.list().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].description, "Salary");
        assert_eq!(stored[1].description, "Netflix");
        // Candidates without a category fall back to the default label
        assert_eq!(stored[0].category.as_deref(), Some(DEFAULT_CATEGORY));
        assert_eq!(stored[0].batch_id, Some(report.batch_id));
    }

    #[tokio::test]
    async fn test_commit_is_best_effort_per_item() {
        let mut session = session_with_duplicate();
        session.toggle_select(1).unwrap(); // include the duplicate: 3 selected
        let store = MemoryStore::failing_on("Netflix");

        let report = session.commit(&store).await.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.committed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].description, "Netflix");
        assert_eq!(session.state(), SessionState::Committed);

        // Exactly attempted minus failed transactions exist afterwards
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_commit_twice_is_rejected() {
        let mut session = session_with_duplicate();
        let store = MemoryStore::new();

        session.commit(&store).await.unwrap();
        let second = session.commit(&store).await;

        assert!(matches!(second, Err(Error::Session(_))));
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_discards_without_side_effects() {
        let mut session = session_with_duplicate();
        session.cancel().unwrap();
        assert_eq!(session.state(), SessionState::Cancelled);

        // Nothing works after cancellation
        assert!(session.toggle_select(0).is_err());
        assert!(session.update_category(0, "X").is_err());
        let store = MemoryStore::new();
        assert!(session.commit(&store).await.is_err());
        assert_eq!(store.list().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_commit_is_rejected() {
        let mut session = session_with_duplicate();
        let store = MemoryStore::new();
        session.commit(&store).await.unwrap();

        assert!(session.cancel().is_err());
        assert_eq!(session.state(), SessionState::Committed);
    }

    #[tokio::test]
    async fn test_empty_selection_commits_zero_of_zero() {
        let mut session = session_with_duplicate();
        session.toggle_select(0).unwrap();
        session.toggle_select(2).unwrap();
        let store = MemoryStore::new();

        let report = session.commit(&store).await.unwrap();

        assert_eq!(report.attempted, 0);
        assert_eq!(report.committed, 0);
        assert_eq!(session.state(), SessionState::Committed);
    }
}

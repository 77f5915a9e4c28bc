//! Confirmation panel shown after a keep gesture.
//!
//! `Closed -> Loading -> Ready -> Closed`. Opening the panel starts two
//! independent lookups (detail and providers); the panel is ready once both
//! have settled, successfully or not. Lookup results are keyed by movie id
//! and dropped when that movie is no longer the pending one.

use serde::Serialize;

use crate::models::{Candidate, ExtendedDetail, MovieId, ProviderAvailability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelState {
    Closed,
    Loading,
    Ready,
}

/// A lookup that has not settled yet, or its (possibly absent) result
#[derive(Debug, Clone, PartialEq)]
enum Slot<T> {
    Pending,
    Settled(Option<T>),
}

impl<T> Slot<T> {
    fn is_settled(&self) -> bool {
        matches!(self, Slot::Settled(_))
    }

    fn value(&self) -> Option<&T> {
        match self {
            Slot::Settled(value) => value.as_ref(),
            Slot::Pending => None,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingConfirmation {
    candidate: Candidate,
    detail: Slot<ExtendedDetail>,
    providers: Slot<ProviderAvailability>,
}

/// Snapshot of the panel for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub state: PanelState,
    pub pending: Option<Candidate>,
    pub detail: Option<ExtendedDetail>,
    pub providers: Option<ProviderAvailability>,
}

#[derive(Debug, Default)]
pub struct DetailPanel {
    pending: Option<PendingConfirmation>,
}

impl DetailPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PanelState {
        match &self.pending {
            None => PanelState::Closed,
            Some(p) if p.detail.is_settled() && p.providers.is_settled() => PanelState::Ready,
            Some(_) => PanelState::Loading,
        }
    }

    pub fn pending_candidate(&self) -> Option<&Candidate> {
        self.pending.as_ref().map(|p| &p.candidate)
    }

    pub fn pending_id(&self) -> Option<MovieId> {
        self.pending_candidate().map(|c| c.id)
    }

    pub fn detail(&self) -> Option<&ExtendedDetail> {
        self.pending.as_ref().and_then(|p| p.detail.value())
    }

    pub fn providers(&self) -> Option<&ProviderAvailability> {
        self.pending.as_ref().and_then(|p| p.providers.value())
    }

    /// Enters `Loading` for `candidate`.
    ///
    /// Returns the candidate that was pending before, if any; it is dropped
    /// without being committed.
    pub fn open(&mut self, candidate: Candidate) -> Option<Candidate> {
        let replaced = self.pending.take().map(|p| p.candidate);
        if let Some(previous) = &replaced {
            tracing::info!(
                movie_id = %previous.id,
                replacement = %candidate.id,
                "Pending confirmation superseded"
            );
        }

        self.pending = Some(PendingConfirmation {
            candidate,
            detail: Slot::Pending,
            providers: Slot::Pending,
        });
        replaced
    }

    /// Records the detail lookup result. Returns `false` if it was stale.
    pub fn apply_detail(&mut self, id: MovieId, detail: Option<ExtendedDetail>) -> bool {
        match self.pending_for(id) {
            Some(pending) => {
                pending.detail = Slot::Settled(detail);
                true
            }
            None => {
                tracing::debug!(movie_id = %id, "Dropping stale detail result");
                false
            }
        }
    }

    /// Records the provider lookup result. Returns `false` if it was stale.
    pub fn apply_providers(&mut self, id: MovieId, providers: Option<ProviderAvailability>) -> bool {
        match self.pending_for(id) {
            Some(pending) => {
                pending.providers = Slot::Settled(providers);
                true
            }
            None => {
                tracing::debug!(movie_id = %id, "Dropping stale providers result");
                false
            }
        }
    }

    /// Closes the panel and hands back the original candidate to commit.
    ///
    /// Allowed while lookups are still loading: missing sections never block
    /// confirmation.
    pub fn confirm(&mut self) -> Option<Candidate> {
        self.pending.take().map(|p| p.candidate)
    }

    /// Closes the panel without committing. The candidate is not returned to
    /// the deck.
    pub fn cancel(&mut self) -> Option<Candidate> {
        self.pending.take().map(|p| p.candidate)
    }

    pub fn view(&self) -> PanelView {
        PanelView {
            state: self.state(),
            pending: self.pending_candidate().cloned(),
            detail: self.detail().cloned(),
            providers: self.providers().cloned(),
        }
    }

    fn pending_for(&mut self, id: MovieId) -> Option<&mut PendingConfirmation> {
        self.pending.as_mut().filter(|p| p.candidate.id == id)
    }
}

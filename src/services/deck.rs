//! Swipe deck engine.
//!
//! Owns the buffered candidate sequence and the read cursor, and decides when
//! the next page should be fetched. The engine performs no I/O: `decide` and
//! `poll_refill` hand back a [`PageRequest`] when a fetch is due, and the
//! caller reports the outcome through `complete_prefetch` / `fail_prefetch`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Candidate, Decision, Direction, MovieId, Page};
use crate::services::providers::tmdb::MAX_PAGE;

pub const DEFAULT_LOW_WATER_MARK: usize = 5;

/// A page fetch the engine wants performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
}

/// Result of a `decide` call
#[derive(Debug, Clone, PartialEq)]
pub struct DecideOutcome {
    pub decision: Decision,
    /// Set when this decision pushed the buffer to the low-water mark
    pub prefetch: Option<PageRequest>,
}

/// Deck state exposed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeckSummary {
    pub cursor: usize,
    pub buffered: usize,
    pub remaining: usize,
    pub next_page: u32,
    /// A page fetch is in flight
    pub loading: bool,
    /// Nothing left to show and nothing more will be fetched
    pub exhausted: bool,
}

pub struct DeckEngine {
    buffer: Vec<Candidate>,
    seen: HashSet<MovieId>,
    cursor: usize,
    next_page: u32,
    last_page: u32,
    in_flight: Option<u32>,
    catalog_exhausted: bool,
    low_water_mark: usize,
    rng: StdRng,
}

impl DeckEngine {
    /// Builds a deck from an already-fetched page.
    ///
    /// `page_number` is the page that produced `initial`; the next fetch asks
    /// for the one after it. The initial results are shuffled like any other
    /// page. An initial page with no results exhausts the catalog, exactly as
    /// an empty prefetched page would.
    pub fn new(initial: Page, page_number: u32, low_water_mark: usize, rng: StdRng) -> Self {
        let mut engine = Self::empty(page_number, low_water_mark, rng);
        if initial.results.is_empty() {
            tracing::info!(page = page_number, "Empty starting page, catalog exhausted");
            engine.catalog_exhausted = true;
        }
        engine.append(initial);
        engine
    }

    /// Builds an empty deck after the fetch of `page_number` failed.
    ///
    /// Unlike an empty page, a failure says nothing about the catalog, so the
    /// first refill asks for the following page.
    pub fn after_failed_start(page_number: u32, low_water_mark: usize, rng: StdRng) -> Self {
        Self::empty(page_number, low_water_mark, rng)
    }

    fn empty(page_number: u32, low_water_mark: usize, rng: StdRng) -> Self {
        Self {
            buffer: Vec::new(),
            seen: HashSet::new(),
            cursor: 0,
            next_page: page_number.saturating_add(1),
            last_page: MAX_PAGE,
            in_flight: None,
            catalog_exhausted: false,
            low_water_mark,
            rng,
        }
    }

    /// The next `n` undecided candidates, top of the stack first
    pub fn visible_window(&self, n: usize) -> &[Candidate] {
        let start = self.cursor.min(self.buffer.len());
        let end = start.saturating_add(n).min(self.buffer.len());
        &self.buffer[start..end]
    }

    /// The candidate at the cursor, the only one that can be dragged
    pub fn top(&self) -> Option<&Candidate> {
        self.buffer.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Buffered candidates not yet decided
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.cursor)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.catalog_exhausted && self.remaining() == 0
    }

    pub fn summary(&self) -> DeckSummary {
        DeckSummary {
            cursor: self.cursor,
            buffered: self.buffer.len(),
            remaining: self.remaining(),
            next_page: self.next_page,
            loading: self.is_loading(),
            exhausted: self.is_exhausted(),
        }
    }

    /// Consumes the top candidate.
    ///
    /// The cursor moves forward by one whatever the direction; a kept
    /// candidate is never offered again even if its confirmation is later
    /// cancelled. Returns `None` only when the buffer is drained.
    pub fn decide(&mut self, direction: Direction) -> Option<DecideOutcome> {
        let candidate = self.buffer.get(self.cursor)?.clone();
        let position = self.cursor;
        self.cursor += 1;

        tracing::debug!(
            movie_id = %candidate.id,
            direction = ?direction,
            position = position,
            remaining = self.remaining(),
            "Decision recorded"
        );

        Some(DecideOutcome {
            decision: Decision {
                candidate,
                direction,
                position,
            },
            prefetch: self.poll_refill(),
        })
    }

    /// Applies the refill policy.
    ///
    /// Returns a request (and marks it in flight) when the remaining buffer
    /// is at or below the low-water mark, no fetch is outstanding, and the
    /// catalog may still have pages.
    pub fn poll_refill(&mut self) -> Option<PageRequest> {
        if self.in_flight.is_some() || self.catalog_exhausted {
            return None;
        }
        if self.remaining() > self.low_water_mark {
            return None;
        }
        if self.next_page > self.last_page {
            tracing::info!(last_page = self.last_page, "Catalog has no further pages");
            self.catalog_exhausted = true;
            return None;
        }

        self.in_flight = Some(self.next_page);
        tracing::debug!(page = self.next_page, remaining = self.remaining(), "Prefetch triggered");
        Some(PageRequest {
            page: self.next_page,
        })
    }

    /// Appends a fetched page in one step and re-applies the refill policy.
    ///
    /// Results for a request that is no longer in flight are dropped. A page
    /// with no results stops automatic prefetching for good.
    pub fn complete_prefetch(&mut self, request: PageRequest, page: Page) -> Option<PageRequest> {
        if self.in_flight != Some(request.page) {
            tracing::warn!(page = request.page, "Dropping page for a request no longer in flight");
            return None;
        }
        self.in_flight = None;

        if page.results.is_empty() {
            tracing::info!(page = request.page, "Empty page, catalog exhausted");
            self.catalog_exhausted = true;
            return None;
        }

        if page.total_pages > 0 {
            self.last_page = page.total_pages.min(MAX_PAGE);
        }
        self.next_page = request.page.saturating_add(1);
        let appended = self.append(page);

        tracing::info!(
            page = request.page,
            appended = appended,
            buffered = self.buffer.len(),
            remaining = self.remaining(),
            "Prefetched page appended"
        );

        self.poll_refill()
    }

    /// Clears the in-flight flag so a later low-water check retries the page
    pub fn fail_prefetch(&mut self, request: PageRequest) {
        if self.in_flight == Some(request.page) {
            self.in_flight = None;
        }
    }

    /// Shuffles the page and appends candidates not already buffered.
    /// Returns how many were appended.
    fn append(&mut self, page: Page) -> usize {
        if page.total_pages > 0 {
            self.last_page = page.total_pages.min(MAX_PAGE);
        }

        let mut results = page.results;
        results.shuffle(&mut self.rng);

        let before = self.buffer.len();
        for candidate in results {
            if self.seen.insert(candidate.id) {
                self.buffer.push(candidate);
            }
        }
        self.buffer.len() - before
    }
}

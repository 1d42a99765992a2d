//! Incremental listing state: one accumulated, id-deduplicated result list
//! per view, fed a page at a time from the metadata client.

use crate::error::Result;
use crate::models::{Actor, Movie};
use std::collections::HashSet;
use std::future::Future;

/// Distance (in presentation units) from the bottom of the rendered content
/// below which the next page is requested.
pub const SCROLL_MARGIN: u32 = 100;

/// The two facts the listing machine needs about a result record.
pub trait Entity {
    fn id(&self) -> i32;
    fn image_path(&self) -> Option<&str>;
}

impl Entity for Movie {
    fn id(&self) -> i32 {
        self.id
    }
    fn image_path(&self) -> Option<&str> {
        self.poster_path.as_deref()
    }
}

impl Entity for Actor {
    fn id(&self) -> i32 {
        self.id
    }
    fn image_path(&self) -> Option<&str> {
        self.profile_path.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search(String),
}

/// Handle for one in-flight fetch. Completions carrying a generation older
/// than the state's current one are discarded; a reset bumps the generation,
/// so a page requested before the reset can never land after it.
#[derive(Debug, Clone, Copy)]
pub struct FetchTicket {
    generation: u64,
    pub page: u32,
}

#[derive(Debug)]
pub struct ListingState<T> {
    mode: Mode,
    items: Vec<T>,
    seen: HashSet<i32>,
    page: u32,
    phase: Phase,
    error: Option<String>,
    has_more: bool,
    generation: u64,
}

impl<T: Entity> Default for ListingState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> ListingState<T> {
    pub fn new() -> Self {
        Self {
            mode: Mode::Browse,
            items: Vec::new(),
            seen: HashSet::new(),
            page: 1,
            phase: Phase::Idle,
            error: None,
            has_more: true,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn query(&self) -> Option<&str> {
        match &self.mode {
            Mode::Browse => None,
            Mode::Search(q) => Some(q),
        }
    }

    /// Whether a scroll position should trigger a fetch. An explicit
    /// load-more action passes distance 0.
    pub fn should_fetch(&self, distance_to_bottom: u32) -> bool {
        distance_to_bottom < SCROLL_MARGIN && self.phase != Phase::Loading && self.has_more
    }

    /// Starts one fetch cycle for the next page. `None` while a cycle is
    /// already in flight or the listing is exhausted.
    pub fn begin(&mut self) -> Option<FetchTicket> {
        if self.phase == Phase::Loading || !self.has_more {
            return None;
        }
        self.phase = Phase::Loading;
        Some(FetchTicket {
            generation: self.generation,
            page: self.page,
        })
    }

    /// Starts the initial bulk load: two consecutive pages fetched before the
    /// first render, leaving the cursor past both.
    pub fn begin_mount(&mut self) -> Option<[FetchTicket; 2]> {
        if self.phase == Phase::Loading {
            return None;
        }
        self.phase = Phase::Loading;
        Some([
            FetchTicket {
                generation: self.generation,
                page: self.page,
            },
            FetchTicket {
                generation: self.generation,
                page: self.page + 1,
            },
        ])
    }

    /// Applies a finished fetch. Entities without a usable image path are
    /// dropped before merging; merging is insert-if-absent by id, so the
    /// first-seen entry wins and a duplicate never overwrites it. A failure
    /// records a message and leaves the accumulated list untouched.
    pub fn complete(&mut self, ticket: FetchTicket, outcome: Result<Vec<T>>) {
        if ticket.generation != self.generation {
            tracing::debug!(page = ticket.page, "discarding stale fetch result");
            return;
        }
        match outcome {
            Ok(batch) => {
                // Emptiness is judged before the image filter: a page whose
                // entries are all posterless still means more pages may exist.
                self.has_more = !batch.is_empty();
                for item in batch {
                    let usable = item.image_path().is_some_and(|p| !p.is_empty());
                    if usable && self.seen.insert(item.id()) {
                        self.items.push(item);
                    }
                }
                self.page = self.page.max(ticket.page + 1);
                self.phase = Phase::Loaded;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.phase = Phase::Error;
            }
        }
    }

    /// Query change (including clearing it): the accumulation restarts from
    /// page 1 under the new mode. Bumping the generation orphans any fetch
    /// still in flight.
    pub fn set_query(&mut self, query: Option<String>) {
        let query = query.filter(|q| !q.trim().is_empty());
        self.mode = match query {
            Some(q) => Mode::Search(q),
            None => Mode::Browse,
        };
        self.items.clear();
        self.seen.clear();
        self.page = 1;
        self.phase = Phase::Idle;
        self.error = None;
        self.has_more = true;
        self.generation += 1;
    }
}

/// Drives the bulk mount load: two consecutive pages requested concurrently,
/// both merged before the caller renders anything. A failed first page stops
/// the merge there, discarding the second page's result, so the error is
/// surfaced and the cursor stays at the failed page for a retry.
pub async fn mount<T, F, Fut>(state: &mut ListingState<T>, fetch: F)
where
    T: Entity,
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let Some([first, second]) = state.begin_mount() else {
        return;
    };
    let (a, b) = tokio::join!(fetch(first.page), fetch(second.page));
    match a {
        Ok(batch) => {
            state.complete(first, Ok(batch));
            state.complete(second, b);
        }
        Err(e) => state.complete(first, Err(e)),
    }
}

/// Drives one single-page fetch cycle. No-op while loading or exhausted.
pub async fn load_next<T, F, Fut>(state: &mut ListingState<T>, fetch: F)
where
    T: Entity,
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let Some(ticket) = state.begin() else {
        return;
    };
    let outcome = fetch(ticket.page).await;
    state.complete(ticket, outcome);
}

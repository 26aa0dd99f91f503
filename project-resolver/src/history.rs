//! History walking over name record version chains.
//!
//! A [`HistoryWalker`] starts from a batch of head records, one per slot,
//! and steps every still-active slot one `previous` link further back per
//! generation. Each step is a single positional lookup for the whole batch,
//! so walking N chains of depth D costs D store round trips, not N × D.
//!
//! ```text
//! slot 0:  C3 ──► C2 ──► C1 ──► ∅
//! slot 1:  S2 ──► S1 ──► ∅
//!          gen 0  gen 1  gen 2
//! ```
//!
//! The caller drives it: `next()` yields a generation, the caller marks the
//! slots it settled with `mark_resolved`, then asks for the next one. Slots
//! marked resolved are never advanced again.

use record_store::{self as store, IdRef, NameRecord, RecordStore, StoreError};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Lifecycle of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Still walking its chain
    Active,
    /// Settled by the caller
    Resolved,
    /// Chain ran out (no `previous`, or the previous record is missing)
    Exhausted,
}

#[derive(Debug, Clone)]
struct Slot {
    state: SlotState,
    record: Option<NameRecord>,
}

impl Slot {
    fn settle(&mut self, state: SlotState) {
        self.state = state;
        self.record = None;
    }
}

/// Resources named by every slot at one step back along the chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Links walked from the heads (0 = the heads themselves)
    pub depth: usize,
    /// One entry per original slot; `None` for slots no longer active
    pub resources: Vec<Option<IdRef>>,
}

impl Generation {
    /// Active slots with their resource.
    pub fn active(&self) -> impl Iterator<Item = (usize, &IdRef)> {
        self.resources
            .iter()
            .enumerate()
            .filter_map(|(index, resource)| resource.as_ref().map(|r| (index, r)))
    }

    /// Distinct resource ids in slot order.
    pub fn resource_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.active()
            .filter(|&(_, resource)| seen.insert(resource.id.as_str()))
            .map(|(_, resource)| resource.id.clone())
            .collect()
    }
}

/// Pull-based walker over a batch of version chains.
pub struct HistoryWalker<'a, S: ?Sized> {
    store: &'a S,
    slots: Vec<Slot>,
    /// Depth of the last generation handed out
    depth: Option<usize>,
    max_generations: Option<usize>,
    finished: bool,
}

impl<'a, S> HistoryWalker<'a, S>
where
    S: RecordStore + ?Sized,
{
    /// Start a walk from head records. Absent heads begin exhausted but keep
    /// their slot position.
    pub fn new(store: &'a S, heads: Vec<Option<NameRecord>>) -> Self {
        let slots = heads
            .into_iter()
            .map(|record| Slot {
                state: if record.is_some() {
                    SlotState::Active
                } else {
                    SlotState::Exhausted
                },
                record,
            })
            .collect();

        Self {
            store,
            slots,
            depth: None,
            max_generations: None,
            finished: false,
        }
    }

    /// Stop after at most `max` generations.
    pub fn with_max_generations(mut self, max: Option<usize>) -> Self {
        self.max_generations = max;
        self
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).map(|slot| slot.state)
    }

    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == SlotState::Active)
            .count()
    }

    /// Mark slots as settled so they are not advanced again.
    ///
    /// Repeated, out-of-range and already inactive indices are ignored.
    pub fn mark_resolved<I>(&mut self, indices: I)
    where
        I: IntoIterator<Item = usize>,
    {
        for index in indices {
            if let Some(slot) = self.slots.get_mut(index) {
                if slot.state == SlotState::Active {
                    slot.settle(SlotState::Resolved);
                }
            }
        }
    }

    /// Yield the next generation, or `None` once no slot is active.
    ///
    /// The first call returns the heads without touching the store. Later
    /// calls advance every active slot with one positional lookup.
    pub async fn next(&mut self) -> Result<Option<Generation>, StoreError> {
        if self.finished {
            return Ok(None);
        }

        let depth = self.depth.map_or(0, |d| d + 1);
        if self.max_generations.is_some_and(|max| depth >= max) {
            debug!(depth, "Generation limit reached");
            self.finished = true;
            return Ok(None);
        }

        if depth > 0 {
            self.advance().await?;
        }

        if self.active_count() == 0 {
            debug!(depth, slots = self.slots.len(), "History walk finished");
            self.finished = true;
            return Ok(None);
        }

        self.depth = Some(depth);
        let resources = self
            .slots
            .iter()
            .map(|slot| match (slot.state, &slot.record) {
                (SlotState::Active, Some(record)) => Some(record.resource.clone()),
                _ => None,
            })
            .collect();

        debug!(depth, active = self.active_count(), "Generation ready");
        Ok(Some(Generation { depth, resources }))
    }

    async fn advance(&mut self) -> Result<(), StoreError> {
        let previous: Vec<Option<String>> = self
            .slots
            .iter()
            .map(|slot| match (slot.state, &slot.record) {
                (SlotState::Active, Some(record)) => record.previous.as_ref().map(|p| p.id.clone()),
                _ => None,
            })
            .collect();

        for (slot, link) in self.slots.iter_mut().zip(&previous) {
            if slot.state == SlotState::Active && link.is_none() {
                slot.settle(SlotState::Exhausted);
            }
        }

        if previous.iter().all(Option::is_none) {
            return Ok(());
        }

        let fetched: Vec<Option<NameRecord>> = store::find_by_ids(self.store, &previous).await?;
        if fetched.len() != previous.len() {
            return Err(StoreError::Misaligned {
                expected: previous.len(),
                actual: fetched.len(),
            });
        }

        for ((slot, link), record) in self.slots.iter_mut().zip(&previous).zip(fetched) {
            let Some(link) = link else { continue };
            match record {
                Some(record) => slot.record = Some(record),
                None => {
                    warn!(previous = %link, "Version chain links to a missing name record");
                    slot.settle(SlotState::Exhausted);
                }
            }
        }

        Ok(())
    }
}

//! Fair assignment of indivisible awards over a candidate pool.
//!
//! One primitive serves every pool in the system: team-internal awards, the
//! shared individual pool, and the multi-category capture sequence. Candidates
//! are kept in a min-heap keyed by a composite rank so the least-served
//! candidate is always popped next; an award moves the candidate out of the
//! minimum band before anyone else in it can be served twice.

use rand::Rng;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// How repeated awards and tie-breaking behave for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Base draw: at most one unit per candidate; ties break by priority
    /// class, then years without an award, then randomness.
    SingleAward,
    /// Multi-category draw: candidates re-enter with their accumulated count;
    /// priority class only orders candidates who have never been served.
    Accumulated,
}

/// One candidate in an assignment pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolEntry {
    /// Units already held when the invocation starts (accumulated plus
    /// carried totals in `Accumulated` mode).
    pub served: u32,
    pub priority: u32,
    pub years_without_award: u32,
}

/// Composite rank; lexicographic order, smallest serves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    served: u32,
    priority: u32,
    starvation: Reverse<u32>,
    tie: u64,
}

impl Rank {
    fn new(entry: &PoolEntry, served: u32, mode: DrawMode, rng: &mut impl Rng) -> Self {
        let (priority, starvation) = match mode {
            DrawMode::SingleAward => (entry.priority, Reverse(entry.years_without_award)),
            DrawMode::Accumulated => {
                let priority = if served == 0 { entry.priority } else { 0 };
                (priority, Reverse(0))
            }
        };
        Self {
            served,
            priority,
            starvation,
            tie: rng.r#gen::<u64>(),
        }
    }
}

/// Award up to `quota` units to the least-served candidates of `pool`.
///
/// Returns the units granted per pool slot, in input order. When the pool
/// cannot absorb the full quota the shortfall is simply left unawarded.
#[must_use]
pub fn assign_units(
    pool: &[PoolEntry],
    quota: u32,
    mode: DrawMode,
    rng: &mut impl Rng,
) -> Vec<u32> {
    let mut granted = vec![0_u32; pool.len()];
    let mut heap: BinaryHeap<Reverse<(Rank, usize)>> = pool
        .iter()
        .enumerate()
        .map(|(slot, entry)| Reverse((Rank::new(entry, entry.served, mode, rng), slot)))
        .collect();

    let mut remaining = quota;
    while remaining > 0 {
        let Some(Reverse((rank, slot))) = heap.pop() else {
            break;
        };
        granted[slot] += 1;
        remaining -= 1;
        if mode == DrawMode::Accumulated {
            let rank = Rank::new(&pool[slot], rank.served + 1, mode, rng);
            heap.push(Reverse((rank, slot)));
        }
    }
    granted
}

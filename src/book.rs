//! Polyglot opening-book selector.
//!
//! Reads a Polyglot `.bin` file (big-endian 16-byte records: key, move,
//! weight, learn) and answers "which book move should I play here", either
//! greedily or by temperature-weighted sampling.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use rand::prelude::*;

use crate::board::{Move, MoveList, Piece, Square};

/// One decoded book record for a position.
#[derive(Clone, Copy, Debug)]
struct BookEntry {
    from: Square,
    to: Square,
    /// `Piece::Pawn` means "no promotion", matching the Polyglot id 0.
    promotion: Piece,
    weight: u16,
}

impl BookEntry {
    /// Does this record describe the given engine move?
    fn matches(&self, mv: Move) -> bool {
        self.from == mv.from()
            && self.to == mv.to()
            && self.promotion == mv.promotion_piece().unwrap_or(Piece::Pawn)
    }
}

/// Opening book: entries per position key, sorted by descending weight.
pub struct BookSelector {
    entries: HashMap<u64, Vec<BookEntry>>,
    rng: Mutex<StdRng>,
}

impl BookSelector {
    /// Load a Polyglot book. An unreadable file yields an empty selector
    /// (every lookup misses) and a logged warning.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("failed to read opening book {}: {err}", path.display());
                Vec::new()
            }
        };

        let mut entries: HashMap<u64, Vec<BookEntry>> = HashMap::new();
        let mut count = 0usize;

        for record in bytes.chunks_exact(16) {
            let key = u64::from_be_bytes(record[0..8].try_into().unwrap_or_default());
            let raw_move = u16::from_be_bytes(record[8..10].try_into().unwrap_or_default());
            let weight = u16::from_be_bytes(record[10..12].try_into().unwrap_or_default());
            // The remaining 4 bytes are the unused learn field

            if raw_move == 0 {
                continue;
            }

            let Some(entry) = decode_entry(raw_move, weight) else {
                log::warn!("skipping book record with bad promotion id: {raw_move:#06x}");
                continue;
            };

            entries.entry(key).or_default().push(entry);
            count += 1;
        }

        for list in entries.values_mut() {
            list.sort_by(|a, b| b.weight.cmp(&a.weight));
        }

        log::info!("loaded {count} book moves from {}", path.display());

        BookSelector {
            entries,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Number of book moves across all positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick a book move for the position `key`, restricted to
    /// `legal_moves`.
    ///
    /// With a (near-)zero temperature the best-weighted matching entry
    /// wins. Otherwise each matching move is weighted `weight^temperature`
    /// and one is sampled from the normalized distribution.
    #[must_use]
    pub fn try_select(&self, key: u64, legal_moves: &MoveList, temperature: f64) -> Option<Move> {
        let entries = self.entries.get(&key)?;

        if temperature.abs() < 1e-8 {
            let found = entries
                .iter()
                .find_map(|entry| legal_moves.iter().copied().find(|&mv| entry.matches(mv)));
            if found.is_none() {
                log::debug!("book key {key:#018x} has no matching legal move");
            }
            return found;
        }

        let mut candidates: Vec<(Move, f64)> = Vec::new();
        let mut total_weight = 0.0;
        for &mv in legal_moves {
            for entry in entries {
                if entry.matches(mv) {
                    let adjusted = f64::from(entry.weight).powf(temperature);
                    total_weight += adjusted;
                    candidates.push((mv, adjusted));
                }
            }
        }

        if candidates.is_empty() || total_weight <= 0.0 {
            log::debug!("book key {key:#018x} has no matching legal move");
            return None;
        }

        let mut draw: f64 = self.rng.lock().gen();
        for (mv, weight) in &candidates {
            let probability = weight / total_weight;
            if draw < probability {
                return Some(*mv);
            }
            draw -= probability;
        }
        Some(candidates[candidates.len() - 1].0)
    }
}

/// Decode a Polyglot move field. Bits 0-2 to-file, 3-5 to-rank, 6-8
/// from-file, 9-11 from-rank, 12-14 promotion id (0 = none, 1..4 =
/// knight..queen). Ranks are counted from White's home rank, matching the
/// internal layout directly.
fn decode_entry(raw: u16, weight: u16) -> Option<BookEntry> {
    let to_file = (raw & 0x7) as usize;
    let to_rank = ((raw >> 3) & 0x7) as usize;
    let from_file = ((raw >> 6) & 0x7) as usize;
    let from_rank = ((raw >> 9) & 0x7) as usize;
    let promotion = Piece::from_index(((raw >> 12) & 0x7) as usize)?;
    if promotion == Piece::King {
        return None;
    }

    Some(BookEntry {
        from: Square::new(from_rank, from_file),
        to: Square::new(to_rank, to_file),
        promotion,
        weight,
    })
}

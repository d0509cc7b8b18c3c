//! Fancy magic bitboards for sliding-piece attacks.
//!
//! Magic multipliers are searched at startup with a fixed RNG seed, so the
//! resulting tables are identical on every run. Each square hashes the
//! relevant blocker subset into a dense attack table via
//! `((occupancy & mask) * magic) >> (64 - bits)`.

use rand::prelude::*;

use crate::board::types::Square;

/// Index bits per square for rook attack tables.
const ROOK_INDEX_BITS: [u32; 64] = [
    12, 11, 11, 11, 11, 11, 11, 12, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    11, 10, 10, 10, 10, 10, 10, 11, //
    12, 11, 11, 11, 11, 11, 11, 12,
];

/// Index bits per square for bishop attack tables.
const BISHOP_INDEX_BITS: [u32; 64] = [
    6, 5, 5, 5, 5, 5, 5, 6, //
    5, 5, 5, 5, 5, 5, 5, 5, //
    5, 5, 7, 7, 7, 7, 5, 5, //
    5, 5, 7, 9, 9, 7, 5, 5, //
    5, 5, 7, 9, 9, 7, 5, 5, //
    5, 5, 7, 7, 7, 7, 5, 5, //
    5, 5, 5, 5, 5, 5, 5, 5, //
    6, 5, 5, 5, 5, 5, 5, 6,
];

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Per-square magic entry pointing into a shared attack array.
struct Magic {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

/// Magic tables for both slider kinds.
pub(crate) struct SliderTables {
    rook_magics: Vec<Magic>,
    bishop_magics: Vec<Magic>,
    rook_attacks: Vec<u64>,
    bishop_attacks: Vec<u64>,
}

/// Attacks computed the slow way, used to fill and verify the magic tables.
fn attacks_by_rays(sq: Square, occupancy: u64, directions: &[(i32, i32)]) -> u64 {
    let mut attacks = 0u64;
    for &(df, dr) in directions {
        let mut current = sq;
        while let Some(next) = current.offset_by(df, dr) {
            attacks |= 1 << next.as_index();
            if occupancy & (1 << next.as_index()) != 0 {
                break;
            }
            current = next;
        }
    }
    attacks
}

/// Relevant-occupancy mask: the rays without their board-edge squares.
fn relevant_mask(sq: Square, directions: &[(i32, i32)]) -> u64 {
    let mut mask = 0u64;
    for &(df, dr) in directions {
        let mut current = sq;
        while let Some(next) = current.offset_by(df, dr) {
            if next.offset_by(df, dr).is_none() {
                break;
            }
            mask |= 1 << next.as_index();
            current = next;
        }
    }
    mask
}

#[inline]
fn magic_index(blockers: u64, magic: u64, shift: u32) -> usize {
    (blockers.wrapping_mul(magic) >> shift) as usize
}

fn sparse_random(rng: &mut StdRng) -> u64 {
    rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>()
}

/// Find a collision-free magic for one square, writing attacks into `table`.
fn find_magic(
    rng: &mut StdRng,
    sq: Square,
    bits: u32,
    offset: usize,
    directions: &[(i32, i32)],
    table: &mut [u64],
) -> Magic {
    let mask = relevant_mask(sq, directions);
    let shift = 64 - bits;
    let size = 1usize << bits;

    // Enumerate every blocker subset of the mask together with its attacks
    let mut blockers = Vec::with_capacity(size);
    let mut attacks = Vec::with_capacity(size);
    let mut subset = 0u64;
    loop {
        blockers.push(subset);
        attacks.push(attacks_by_rays(sq, subset, directions));
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }

    loop {
        let magic = sparse_random(rng);
        // Candidates that hash the mask into a sparse top byte fail fast
        if (mask.wrapping_mul(magic) & 0xFF00_0000_0000_0000).count_ones() < 6 {
            continue;
        }

        table.fill(0);
        let mut used = vec![false; size];
        let mut ok = true;
        for (blocker, attack) in blockers.iter().zip(attacks.iter()) {
            let index = magic_index(*blocker, magic, shift);
            if used[index] && table[index] != *attack {
                ok = false;
                break;
            }
            used[index] = true;
            table[index] = *attack;
        }

        if ok {
            return Magic {
                mask,
                magic,
                shift,
                offset,
            };
        }
    }
}

impl SliderTables {
    /// Search magics for all 64 squares of both slider kinds.
    pub(crate) fn build() -> Self {
        // Fixed seed keeps the magics (and startup time) reproducible
        let mut rng = StdRng::seed_from_u64(0xAB3C_5A7D_91E4_F2BA);

        let rook_size: usize = ROOK_INDEX_BITS.iter().map(|&b| 1usize << b).sum();
        let bishop_size: usize = BISHOP_INDEX_BITS.iter().map(|&b| 1usize << b).sum();

        let mut rook_attacks = vec![0u64; rook_size];
        let mut bishop_attacks = vec![0u64; bishop_size];
        let mut rook_magics = Vec::with_capacity(64);
        let mut bishop_magics = Vec::with_capacity(64);

        let mut offset = 0;
        for idx in 0..64 {
            let bits = ROOK_INDEX_BITS[idx];
            let end = offset + (1usize << bits);
            rook_magics.push(find_magic(
                &mut rng,
                Square::from_index(idx),
                bits,
                offset,
                &ROOK_DIRECTIONS,
                &mut rook_attacks[offset..end],
            ));
            offset = end;
        }

        let mut offset = 0;
        for idx in 0..64 {
            let bits = BISHOP_INDEX_BITS[idx];
            let end = offset + (1usize << bits);
            bishop_magics.push(find_magic(
                &mut rng,
                Square::from_index(idx),
                bits,
                offset,
                &BISHOP_DIRECTIONS,
                &mut bishop_attacks[offset..end],
            ));
            offset = end;
        }

        SliderTables {
            rook_magics,
            bishop_magics,
            rook_attacks,
            bishop_attacks,
        }
    }

    #[inline]
    pub(crate) fn rook_attacks(&self, sq: Square, occupancy: u64) -> u64 {
        let magic = &self.rook_magics[sq.as_index()];
        let index = magic_index(occupancy & magic.mask, magic.magic, magic.shift);
        self.rook_attacks[magic.offset + index]
    }

    #[inline]
    pub(crate) fn bishop_attacks(&self, sq: Square, occupancy: u64) -> u64 {
        let magic = &self.bishop_magics[sq.as_index()];
        let index = magic_index(occupancy & magic.mask, magic.magic, magic.shift);
        self.bishop_attacks[magic.offset + index]
    }
}

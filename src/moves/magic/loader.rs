use super::constants::{
    BISHOP_MAGIC, BISHOP_MASK, BISHOP_SHIFT, ROOK_MAGIC, ROOK_MASK, ROOK_SHIFT,
};
use super::rays::{bishop_rays, rook_rays};
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use tracing::debug;

/// Spread the low bits of `index` over the set bits of `mask`, enumerating
/// every blocker subset as `index` runs over `0..(1 << mask.count_ones())`.
fn blocker_subset(mask: u64, index: usize) -> u64 {
    let mut subset = 0u64;
    let mut rest = mask;
    let mut bit_no = 0;
    while rest != 0 {
        let sq = rest.trailing_zeros();
        if index >> bit_no & 1 != 0 {
            subset |= 1u64 << sq;
        }
        rest &= rest - 1;
        bit_no += 1;
    }
    subset
}

fn build_entry(
    square: usize,
    magic: u64,
    mask: u64,
    shift: u32,
    table_len: usize,
    rays: fn(usize, u64) -> u64,
) -> MagicEntry {
    let mut entry = MagicEntry {
        magic,
        shift,
        mask,
        table: vec![0u64; table_len].into_boxed_slice(),
    };
    for index in 0..(1usize << mask.count_ones()) {
        let blockers = blocker_subset(mask, index);
        let attacks = rays(square, blockers);
        let slot = entry.slot(blockers);
        // Shared slots must agree, otherwise the magic constant is broken.
        assert!(
            entry.table[slot] == 0 || entry.table[slot] == attacks,
            "magic collision on square {} slot {}",
            square,
            slot
        );
        entry.table[slot] = attacks;
    }
    entry
}

/// Build both slider tables from the fixed constants. Every blocker subset
/// is pushed through the hash while building, so a bad constant panics here
/// instead of corrupting search results later.
pub fn build_magic_tables() -> MagicTables {
    let rook = RookMagicTables {
        entries: (0..64)
            .map(|sq| build_entry(sq, ROOK_MAGIC[sq], ROOK_MASK[sq], ROOK_SHIFT, 4096, rook_rays))
            .collect(),
    };
    let bishop = BishopMagicTables {
        entries: (0..64)
            .map(|sq| {
                build_entry(sq, BISHOP_MAGIC[sq], BISHOP_MASK[sq], BISHOP_SHIFT, 512, bishop_rays)
            })
            .collect(),
    };
    debug!("magic tables built");
    MagicTables { rook, bishop }
}

#[cfg(feature = "load_magic")]
const MAGIC_CACHE: &str = "magic.bin";

/// Obtain the slider tables. With the `load_magic` feature a bincode cache
/// file is used when present and written after a fresh build; otherwise the
/// tables are always rebuilt (a few milliseconds at startup).
pub fn load_magic_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    {
        if let Ok(bytes) = std::fs::read(MAGIC_CACHE)
            && let Ok(tables) = bincode::deserialize::<MagicTables>(&bytes)
        {
            debug!("magic tables loaded from {}", MAGIC_CACHE);
            return tables;
        }
        let tables = build_magic_tables();
        if let Ok(bytes) = bincode::serialize(&tables) {
            let _ = std::fs::write(MAGIC_CACHE, bytes);
        }
        tables
    }
    #[cfg(not(feature = "load_magic"))]
    build_magic_tables()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocker_subsets_enumerate_the_mask() {
        let mask = ROOK_MASK[0];
        let n = 1usize << mask.count_ones();
        assert_eq!(blocker_subset(mask, 0), 0);
        assert_eq!(blocker_subset(mask, n - 1), mask);
        // A middle index stays inside the mask.
        assert_eq!(blocker_subset(mask, n / 2) & !mask, 0);
    }

    #[test]
    fn every_rook_permutation_round_trips() {
        // Construction itself asserts consistency; spot-check one square
        // exhaustively against the scan generator.
        let tables = build_magic_tables();
        let sq = 42; // c6
        let mask = ROOK_MASK[sq];
        for index in 0..(1usize << mask.count_ones()) {
            let blockers = blocker_subset(mask, index);
            assert_eq!(
                tables.rook.get_attacks(sq, blockers),
                rook_rays(sq, blockers)
            );
        }
    }

    #[test]
    fn every_bishop_permutation_round_trips() {
        let tables = build_magic_tables();
        let sq = 27; // d4
        let mask = BISHOP_MASK[sq];
        for index in 0..(1usize << mask.count_ones()) {
            let blockers = blocker_subset(mask, index);
            assert_eq!(
                tables.bishop.get_attacks(sq, blockers),
                bishop_rays(sq, blockers)
            );
        }
    }
}

//! Seeded down-sampling of the review table

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Keep at most `max` records chosen uniformly with a fixed seed. Survivors
/// stay in their input order so the dedup policy downstream sees the same
/// sequence it would have seen without sampling.
pub fn sample_in_order<T>(records: Vec<T>, max: usize, seed: u64) -> Vec<T> {
    if records.len() <= max {
        return records;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut keep = rand::seq::index::sample(&mut rng, records.len(), max).into_vec();
    keep.sort_unstable();

    let mut wanted = keep.into_iter().peekable();
    records
        .into_iter()
        .enumerate()
        .filter_map(|(pos, record)| {
            if wanted.peek() == Some(&pos) {
                wanted.next();
                Some(record)
            } else {
                None
            }
        })
        .collect()
}

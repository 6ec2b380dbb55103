use rand::RngCore;
use tmd_core::rng::{derive_substream_seed, RngHandle};

#[test]
fn rng_emits_reproducible_sequence() {
    let mut rng_a = RngHandle::from_seed(1234);
    let mut rng_b = RngHandle::from_seed(1234);

    let seq_a: Vec<u64> = (0..100).map(|_| rng_a.next_u64()).collect();
    let seq_b: Vec<u64> = (0..100).map(|_| rng_b.next_u64()).collect();

    assert_eq!(seq_a, seq_b);
}

#[test]
fn substreams_are_stable_and_distinct() {
    let seeds: Vec<u64> = (0..32).map(|idx| derive_substream_seed(42, idx)).collect();
    let unique: std::collections::BTreeSet<_> = seeds.iter().collect();
    assert_eq!(unique.len(), seeds.len());
    assert_eq!(seeds[3], derive_substream_seed(42, 3));
}

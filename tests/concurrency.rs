use barcut::*;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use std::sync::Arc;

const ADAPTER: &[u8] = b"AGATCGGAAGAGC";

fn random_reads(n: usize, seed: u64) -> Vec<Read> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    (0..n)
        .map(|i| {
            let len = rng.gen_range(20..80);
            let mut seq = (0..len).map(|_| *b"ACGT".choose(&mut rng).unwrap()).collect::<Vec<_>>();

            // half of the reads end in a prefix of the adapter
            if rng.gen_bool(0.5) {
                let overlap = rng.gen_range(3..=ADAPTER.len());
                seq.extend_from_slice(&ADAPTER[..overlap]);
            }

            Read::from_fasta(format!("read{i}").as_bytes(), &seq)
        })
        .collect()
}

fn new_aligner() -> SeqAligner {
    let queries = QuerySet::new(vec![("truseq".to_owned(), ADAPTER.to_vec())]).unwrap();
    let options = AlignOptions {
        bundle_size: 16,
        removal_tags: true,
        ..AlignOptions::adapter()
    };

    SeqAligner::new(Arc::new(queries), QueryKind::Adapter, &options).unwrap()
}

#[test]
fn threads_do_not_change_results() {
    let reads = random_reads(1000, 0);

    let single = new_aligner();
    let mut single_reads = reads.clone();
    let single_ids = single.align_with_threads(&mut single_reads, true, 1).unwrap();

    let multi = new_aligner();
    let mut multi_reads = reads;
    let multi_ids = multi.align_with_threads(&mut multi_reads, true, 4).unwrap();

    assert_eq!(single_ids, multi_ids);
    assert_eq!(single_reads, multi_reads);

    assert_eq!(single.n_modified_reads(), multi.n_modified_reads());
    assert_eq!(single.n_unmatched_reads(), multi.n_unmatched_reads());
    assert_eq!(single.n_pre_short_reads(), multi.n_pre_short_reads());
    assert_eq!(single.overlaps().summary(), multi.overlaps().summary());
    assert_eq!(single.queries().removal_table(), multi.queries().removal_table());
}

#[test]
fn counters_agree_under_threads() {
    let aligner = new_aligner();
    let mut reads = random_reads(1000, 1);
    let ids = aligner.align_with_threads(&mut reads, true, 4).unwrap();

    let modified = ids.iter().filter(|&&id| id > 0).count();
    assert!(modified > 0);
    assert_eq!(aligner.n_modified_reads(), modified);
    assert_eq!(aligner.overlaps().total(), modified as u64);

    let query = aligner.queries().get(0).unwrap();
    assert_eq!(query.removals(), modified as u64);
    assert!(query.full_removals() <= query.removals());

    let tagged = reads
        .iter()
        .filter(|r| r.name().ends_with(b"_Flexbar_removal_truseq"))
        .count();
    assert_eq!(tagged, modified);
    assert_eq!(
        aligner.n_modified_reads() + aligner.n_unmatched_reads() + aligner.n_pre_short_reads(),
        reads.len()
    );
}

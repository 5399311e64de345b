use barcut::*;

use flate2::read::GzDecoder;

use std::fs;
use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Arc;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("barcut_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn trims_fastq_records_end_to_end() {
    let fastq = b"@r1\nAAACCGTTAGATCGGAAG\n+\nIIIIIIII##########\n@r2\nACGT\n+\nIIII\n@r3\nCCCCCCCCCCCCCCCCCCCC\n+\nIIIIIIIIIIIIIIIIIIII\n";
    let adapters = "
        name: adapters
        patterns:
          - pattern: AGATCGGAAGAGC
            id: truseq
    ";

    let options = AlignOptions {
        format: Fastq,
        removal_tags: true,
        ..AlignOptions::adapter()
    };
    let queries = Arc::new(QuerySet::from_yaml(adapters.as_bytes()).unwrap());
    let aligner = SeqAligner::new(queries, QueryKind::Adapter, &options).unwrap();

    let mut reads = iter_fastx_bytes(fastq, 2).unwrap().read_all().unwrap();
    let ids = aligner.align_with_threads(&mut reads, true, 2).unwrap();
    assert_eq!(ids, vec![1, 0, 0]);

    let mut out = Vec::new();
    for read in &reads {
        write_fastq_record(&mut out, read).unwrap();
    }

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "@r1_Flexbar_removal_truseq\nAAACCGTT\n+\nIIIIIIII\n\
         @r2\nACGT\n+\nIIII\n\
         @r3\nCCCCCCCCCCCCCCCCCCCC\n+\nIIIIIIIIIIIIIIIIIIII\n"
    );

    assert_eq!(aligner.n_modified_reads(), 1);
    assert_eq!(aligner.n_pre_short_reads(), 1);
    assert_eq!(aligner.n_unmatched_reads(), 1);
    assert_eq!(
        aligner.overlap_stats_string(),
        "Min, max, mean and median adapter overlap: 10 / 10 / 10 / 10"
    );
    assert_eq!(
        aligner.queries().removal_table(),
        "id\tremoved\tfull_length\ntruseq\t1\t0\n"
    );
}

#[test]
fn splits_reads_by_removed_side() {
    let queries = QuerySet::new(vec![("bc1".to_owned(), b"ACGTAC".to_vec())])
        .unwrap()
        .with_reverse_complements();
    let options = AlignOptions {
        trim_end: Any,
        removal_tags: true,
        min_read_length: 0,
        ..AlignOptions::adapter()
    };
    let aligner = SeqAligner::new(Arc::new(queries), QueryKind::Adapter, &options).unwrap();

    let mut reads = vec![
        Read::from_fasta(b"r1", b"ACGTACTTTTTTTTTTGGGG"),
        Read::from_fasta(b"r2", b"TTTTTTTTTTGGGGGTACGT"),
        Read::from_fasta(b"r3", b"CCCCCCCCCCCCCCCCCCCC"),
    ];
    let ids = aligner.align_bundle(&mut reads, true).unwrap();
    assert_eq!(ids, vec![1, 2, 0]);
    assert_eq!(reads[0].name(), b"r1_Flexbar_removal_bc1");
    assert_eq!(reads[1].name(), b"r2_Flexbar_removal_bc1 revcomp");

    let dir = temp_dir("split");
    let input = dir.join("trimmed.fasta");
    let mut fasta = Vec::new();
    for read in &reads {
        write_fasta_record(&mut fasta, read).unwrap();
    }
    fs::write(&input, fasta).unwrap();

    let outputs = SplitOutputs {
        left: dir.join("left.fasta"),
        right: dir.join("right.fasta.gz"),
    };
    let counts = split_removed_reads(input.to_str().unwrap(), &outputs, 3).unwrap();
    assert_eq!(
        counts,
        SplitCounts {
            left: 1,
            right: 1,
            skipped: 1
        }
    );

    let left = fs::read_to_string(&outputs.left).unwrap();
    assert_eq!(left, ">r1_Flexbar_removal_bc1\nTTTTTTTTTT\n");

    let mut right = String::new();
    GzDecoder::new(fs::File::open(&outputs.right).unwrap())
        .read_to_string(&mut right)
        .unwrap();
    assert_eq!(right, ">r2_Flexbar_removal_bc1 revcomp\nTTTTTTGGGG\n");

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn split_outputs_follow_the_prefix() {
    let outputs = SplitOutputs::from_prefix("out/sample");

    assert_eq!(outputs.left, PathBuf::from("out/sample_left_tail_trimmed.fasta"));
    assert_eq!(outputs.right, PathBuf::from("out/sample_right_tail_trimmed.fasta"));
}

#[test]
fn demultiplexes_paired_reads() {
    let barcodes = QuerySet::from_fasta_bytes(b">bc1\nACGTAC\n>bc2\nTTGGCA\n").unwrap();
    let filter = PairedFilter::new(
        Some(BarcodeStage {
            detect: WithinReadRemoval,
            aligner: SeqAligner::new(Arc::new(barcodes), QueryKind::Barcode, &AlignOptions::barcode()).unwrap(),
            aligner2: None,
        }),
        None,
    )
    .unwrap();

    let mut reads = (0..40)
        .map(|i| {
            let bc: &[u8] = if i % 2 == 0 { b"ACGTAC" } else { b"TTGGCA" };
            let mut seq = bc.to_vec();
            seq.extend_from_slice(b"GATTACAGATTACA");
            PairedRead::new(
                Read::from_fasta(format!("p{i}/1").as_bytes(), &seq),
                Some(Read::from_fasta(format!("p{i}/2").as_bytes(), b"CCCCCCCCCC")),
                None,
            )
        })
        .collect::<Vec<_>>();

    filter.process_with_threads(&mut reads, 4).unwrap();

    for (i, p) in reads.iter().enumerate() {
        assert_eq!(p.bar_id, if i % 2 == 0 { 1 } else { 2 });
        assert_eq!(p.r1.seq(), b"GATTACAGATTACA");
    }

    let stage = filter.barcodes().unwrap();
    assert_eq!(stage.aligner.queries().get(0).unwrap().removals(), 20);
    assert_eq!(stage.aligner.queries().get(1).unwrap().full_removals(), 20);
}

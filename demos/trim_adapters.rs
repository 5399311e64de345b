use barcut::*;

use std::io::Write;
use std::sync::Arc;

fn main() {
    let fastq = b"@read1
ACGTTGCAAGGCTTAGATCGGAAGAGCACAC
+
0123456789012345678901234567890
@read2
TTTTGGGGCCCCAAAATTTTGGGGAGATCGG
+
0123456789012345678901234567890
@read3
ACGTACGTACGTACGTACGTACGTACGT
+
0123456789012345678901234567";

    let adapters = "
        name: adapters
        patterns:
          - pattern: AGATCGGAAGAGC
            id: truseq
          - pattern: CTGTCTCTTATACACATCT
            id: nextera
    ";

    let options = AlignOptions {
        format: Fastq,
        removal_tags: true,
        log_align: Tab,
        ..AlignOptions::adapter()
    };

    let queries = Arc::new(QuerySet::from_yaml(adapters.as_bytes()).unwrap_or_else(|e| panic!("{e}")));
    let aligner = SeqAligner::new(queries, QueryKind::Adapter, &options).unwrap_or_else(|e| panic!("{e}"));

    let mut reads = iter_fastx_bytes(fastq, options.bundle_size)
        .and_then(|r| r.read_all())
        .unwrap_or_else(|e| panic!("{e}"));
    aligner
        .align_with_threads(&mut reads, true, 2)
        .unwrap_or_else(|e| panic!("{e}"));

    let mut out = std::io::stdout();
    for read in &reads {
        write_fastq_record(&mut out, read).unwrap_or_else(|e| panic!("{e}"));
    }
    out.flush().unwrap_or_else(|e| panic!("{e}"));

    println!("{}", aligner.overlap_stats_string());
    print!("{}", aligner.queries().removal_table());
}

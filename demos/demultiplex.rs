use barcut::*;

use std::sync::Arc;

fn main() {
    // R1: barcode[6] insert
    // R2: insert adapter

    let barcodes = b">sample1
ACGTAC
>sample2
TTGGCA
";

    let adapters = "
        name: adapter
        patterns:
          - pattern: ATATATATAT
    ";

    let reads = [
        ("read1", "ACGTACGATTACAGATTACA", "CCCCGGGGAAAATATATATAT"),
        ("read2", "TTGGCAGATTACAGATTACA", "CCCCGGGGAAAATTTT"),
        ("read3", "GGGGGGGATTACAGATTACA", "CCCCGGGGAAAATATAT"),
    ];

    let mut reads = reads
        .iter()
        .map(|(name, r1, r2)| {
            PairedRead::new(
                Read::from_fasta(format!("{name}/1").as_bytes(), r1.as_bytes()),
                Some(Read::from_fasta(format!("{name}/2").as_bytes(), r2.as_bytes())),
                None,
            )
        })
        .collect::<Vec<_>>();

    let barcodes = Arc::new(QuerySet::from_fasta_bytes(barcodes).unwrap_or_else(|e| panic!("{e}")));
    let adapters = Arc::new(QuerySet::from_yaml(adapters.as_bytes()).unwrap_or_else(|e| panic!("{e}")));

    let adapter_options = AlignOptions {
        min_read_length: 0,
        ..AlignOptions::adapter()
    };

    let filter = PairedFilter::new(
        Some(BarcodeStage {
            detect: WithinReadRemoval,
            aligner: SeqAligner::new(barcodes.clone(), QueryKind::Barcode, &AlignOptions::barcode())
                .unwrap_or_else(|e| panic!("{e}")),
            aligner2: None,
        }),
        Some(AdapterStage {
            removal: Two,
            aligner: SeqAligner::new(adapters, QueryKind::Adapter, &adapter_options)
                .unwrap_or_else(|e| panic!("{e}")),
            aligner2: None,
        }),
    )
    .unwrap_or_else(|e| panic!("{e}"));

    filter
        .process_with_threads(&mut reads, 2)
        .unwrap_or_else(|e| panic!("{e}"));

    for p in &reads {
        let sample = match p.bar_id {
            0 => "unassigned",
            id => barcodes.get(id - 1).map_or("unassigned", |q| q.id()),
        };

        println!("{sample}\n{p}");
    }
}

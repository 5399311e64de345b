use barcut::*;

use std::fs;

fn main() {
    // reads tagged by a barcode run with reverse complements and removal tags
    let fasta = b">read1_Flexbar_removal_bc1
TTTTTTTTTTGGGG
>read2_Flexbar_removal_bc1 revcomp
TTTTTTTTTTGGGG
>read3
CCCCCCCCCCCCCC
";

    let dir = std::env::temp_dir().join("barcut_split_demo");
    fs::create_dir_all(&dir).unwrap_or_else(|e| panic!("{e}"));

    let input = dir.join("trimmed.fasta");
    fs::write(&input, fasta).unwrap_or_else(|e| panic!("{e}"));

    let outputs = SplitOutputs::from_prefix(dir.join("sample").to_string_lossy());
    let counts = split_removed_reads(input.to_string_lossy(), &outputs, 3).unwrap_or_else(|e| panic!("{e}"));

    println!("{counts:?}");
    print!("{}", fs::read_to_string(&outputs.left).unwrap_or_else(|e| panic!("{e}")));
    print!("{}", fs::read_to_string(&outputs.right).unwrap_or_else(|e| panic!("{e}")));
}

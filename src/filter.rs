use crate::errors::*;
use crate::read::PairedRead;
use crate::seq_align::{run_bundles, SeqAligner};

pub use AdapterRemoval::*;
pub use BarcodeDetect::*;

/// Where barcodes are searched and whether they are removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BarcodeDetect {
    /// Separate barcode read, detection only.
    BarcodeRead,
    /// First read, detection only.
    WithinRead,
    WithinReadRemoval,
    /// First read with the first barcode set, second read with the second set.
    WithinRead2,
    WithinReadRemoval2,
}

impl BarcodeDetect {
    fn removes(self) -> bool {
        matches!(self, WithinReadRemoval | WithinReadRemoval2)
    }

    fn uses_second_set(self) -> bool {
        matches!(self, WithinRead2 | WithinReadRemoval2)
    }
}

/// Which mates adapters are removed from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AdapterRemoval {
    /// Same adapters on both mates.
    Normal,
    /// Second adapter set for the second mate.
    Normal2,
    /// First mate only.
    One,
    /// Second mate only.
    Two,
}

pub struct BarcodeStage {
    pub detect: BarcodeDetect,
    pub aligner: SeqAligner,
    pub aligner2: Option<SeqAligner>,
}

pub struct AdapterStage {
    pub removal: AdapterRemoval,
    pub aligner: SeqAligner,
    pub aligner2: Option<SeqAligner>,
}

/// Barcode detection followed by adapter removal over bundles of paired reads.
///
/// Each stage runs its own stage, compute, extract cycle over the whole bundle.
pub struct PairedFilter {
    barcodes: Option<BarcodeStage>,
    adapters: Option<AdapterStage>,
    bundle_size: usize,
}

impl PairedFilter {
    pub fn new(barcodes: Option<BarcodeStage>, adapters: Option<AdapterStage>) -> Result<Self> {
        if let Some(b) = &barcodes {
            if b.detect.uses_second_set() != b.aligner2.is_some() {
                return Err(Error::InvalidConfig {
                    field: "barcodes2",
                    reason: format!("{:?} needs a second barcode set exactly when detecting in both reads", b.detect),
                });
            }
        }

        if let Some(a) = &adapters {
            if (a.removal == Normal2) != a.aligner2.is_some() {
                return Err(Error::InvalidConfig {
                    field: "adapters2",
                    reason: "a second adapter set is used only with Normal2".to_owned(),
                });
            }
        }

        let bundle_size = barcodes
            .as_ref()
            .map(|b| b.aligner.options().bundle_size)
            .or_else(|| adapters.as_ref().map(|a| a.aligner.options().bundle_size))
            .unwrap_or(256);

        Ok(Self {
            barcodes,
            adapters,
            bundle_size,
        })
    }

    pub fn barcodes(&self) -> Option<&BarcodeStage> {
        self.barcodes.as_ref()
    }

    pub fn adapters(&self) -> Option<&AdapterStage> {
        self.adapters.as_ref()
    }

    pub fn process_bundle(&self, bundle: &mut [PairedRead]) -> Result<()> {
        if let Some(stage) = &self.barcodes {
            let remove = stage.detect.removes();

            let ids = match stage.detect {
                BarcodeRead => stage.aligner.align_selected(bundle, |p| p.barcode.as_mut(), false)?,
                _ => stage.aligner.align_selected(bundle, |p| Some(&mut p.r1), remove)?,
            };
            for (p, id) in bundle.iter_mut().zip(ids) {
                p.bar_id = id;
            }

            if let Some(aligner2) = &stage.aligner2 {
                let ids = aligner2.align_selected(bundle, |p| p.r2.as_mut(), remove)?;
                for (p, id) in bundle.iter_mut().zip(ids) {
                    p.bar_id2 = id;
                }
            }
        }

        if let Some(stage) = &self.adapters {
            match stage.removal {
                Normal | Normal2 => {
                    stage.aligner.align_selected(bundle, |p| Some(&mut p.r1), true)?;

                    let aligner2 = stage.aligner2.as_ref().unwrap_or(&stage.aligner);
                    aligner2.align_selected(bundle, |p| p.r2.as_mut(), true)?;
                }
                One => {
                    stage.aligner.align_selected(bundle, |p| Some(&mut p.r1), true)?;
                }
                Two => {
                    stage.aligner.align_selected(bundle, |p| p.r2.as_mut(), true)?;
                }
            }
        }

        Ok(())
    }

    pub fn process_with_threads(&self, reads: &mut [PairedRead], threads: usize) -> Result<()> {
        run_bundles(reads.chunks_mut(self.bundle_size), threads, |bundle: &mut [PairedRead]| {
            self.process_bundle(bundle)
        })
    }
}

use flate2::write::GzEncoder;
use flate2::Compression;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::errors::*;

/// Shared sink for alignment records.
///
/// Each record is written under one lock acquisition so records from different workers
/// never interleave.
pub struct AlignmentLog {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl AlignmentLog {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Gzip compressed if the path ends in `.gz`.
    pub fn to_file(file: impl AsRef<Path>) -> Result<Self> {
        let file = file.as_ref();
        let f = File::create(file).map_err(|e| Error::FileIo {
            file: file.display().to_string(),
            source: Box::new(e),
        })?;

        let writer: Box<dyn Write + Send> = if file.extension().map_or(false, |ext| ext == "gz") {
            Box::new(GzEncoder::new(BufWriter::new(f), Compression::default()))
        } else {
            Box::new(BufWriter::new(f))
        };

        Ok(Self::new(writer))
    }

    pub fn write_record(&self, record: &str) -> Result<()> {
        // a poisoned lock only means another worker panicked mid-record
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write_all(record.as_bytes()).map_err(Error::LogIo)
    }

    pub fn flush(&self) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.flush().map_err(Error::LogIo)
    }
}

impl Drop for AlignmentLog {
    fn drop(&mut self) {
        if let Ok(writer) = self.writer.get_mut() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn records_do_not_interleave() {
        let buf = SharedBuf::default();
        let log = AlignmentLog::new(Box::new(buf.clone()));

        std::thread::scope(|s| {
            for t in 0..4 {
                let log = &log;
                s.spawn(move || {
                    for _ in 0..50 {
                        log.write_record(&format!("{t}{t}{t}\n")).unwrap();
                    }
                });
            }
        });

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(out.lines().count(), 200);
        assert!(out.lines().all(|l| l.len() == 3 && l.chars().all(|c| c == l.as_bytes()[0] as char)));
    }
}

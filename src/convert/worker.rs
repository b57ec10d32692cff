//! Background mzML -> Parquet conversion
//!
//! The job runs on its own thread and reports through a channel: any number
//! of timestamped progress lines followed by exactly one `Finished` event.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};

use polars::prelude::*;

use super::mzml::{self, Spectrum};
use crate::constants::columns::{INTENSITY, MS_LEVEL, MZ, PRECURSOR_MZ, SCAN_NUMBER};
use crate::data::PeakTable;
use crate::error::{Result, ViewerError};

/// Spectra between two "read N spectra" progress lines
const PROGRESS_EVERY: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionEvent {
    /// One log line, already prefixed with `[HH:MM:SS]`
    Progress(String),
    /// Terminal event, sent once
    Finished {
        success: bool,
        message: String,
        output: Option<PathBuf>,
    },
}

/// What a successful conversion produced
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub spectra: usize,
    pub rows: usize,
    pub bytes_written: u64,
}

/// `[HH:MM:SS] message` in local time
pub fn timestamped(message: &str) -> String {
    format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), message)
}

/// Parquet file written next to the input
pub fn output_path(input: &Path) -> PathBuf {
    input.with_extension("parquet")
}

/// Flatten spectra into the peak-table schema; scan number and MS level are
/// stored as Int32
pub fn spectra_to_table(spectra: &[Spectrum]) -> Result<PeakTable> {
    let rows: usize = spectra.iter().map(|s| s.mz.len()).sum();
    let mut scan_numbers: Vec<i32> = Vec::with_capacity(rows);
    let mut mz: Vec<f64> = Vec::with_capacity(rows);
    let mut intensity: Vec<f64> = Vec::with_capacity(rows);
    let mut ms_level: Vec<i32> = Vec::with_capacity(rows);
    let mut precursor: Vec<Option<f64>> = Vec::with_capacity(rows);

    for spectrum in spectra {
        let scan = i32::try_from(spectrum.index).map_err(|_| {
            ViewerError::Conversion(format!("spectrum index {} out of range", spectrum.index))
        })?;
        for peak in spectrum.peaks() {
            scan_numbers.push(scan);
            mz.push(peak.mz);
            intensity.push(peak.intensity);
            ms_level.push(i32::from(peak.ms_level));
            precursor.push(peak.precursor_mz);
        }
    }

    let df = df!(
        SCAN_NUMBER => scan_numbers,
        MZ => mz,
        INTENSITY => intensity,
        MS_LEVEL => ms_level,
        PRECURSOR_MZ => precursor
    )?;
    Ok(PeakTable::from_dataframe(df, None))
}

/// Convert synchronously, reporting progress lines through `progress`
pub fn convert_file(
    input: &Path,
    output: &Path,
    progress: &mut dyn FnMut(&str),
) -> Result<ConversionSummary> {
    profiling::scope!("convert_file");
    progress(&format!("Reading {}", input.display()));

    let spectra = mzml::read_file(input, |count| {
        if count % PROGRESS_EVERY == 0 {
            progress(&format!("Read {} spectra", count));
        }
    })?;
    progress(&format!("Read {} spectra in total", spectra.len()));

    let table = spectra_to_table(&spectra)?;
    progress(&format!("Writing {} rows to {}", table.height(), output.display()));
    let bytes_written = table.write_parquet(output)?;

    Ok(ConversionSummary {
        spectra: spectra.len(),
        rows: table.height(),
        bytes_written,
    })
}

/// Handle to a running conversion
pub struct ConversionJob {
    input: PathBuf,
    rx: Receiver<ConversionEvent>,
    handle: Option<JoinHandle<()>>,
    finished: bool,
}

impl ConversionJob {
    /// Spawn the worker thread for `input`
    pub fn spawn(input: PathBuf) -> Self {
        let (tx, rx) = channel::<ConversionEvent>();
        let job_input = input.clone();

        let handle = thread::spawn(move || {
            Self::run(&job_input, tx);
        });

        Self {
            input,
            rx,
            handle: Some(handle),
            finished: false,
        }
    }

    fn run(input: &Path, tx: Sender<ConversionEvent>) {
        let output = output_path(input);
        tracing::info!(input = %input.display(), "conversion started");

        let mut report = |line: &str| {
            let _ = tx.send(ConversionEvent::Progress(timestamped(line)));
        };
        let result = convert_file(input, &output, &mut report);

        let finished = match result {
            Ok(summary) => {
                tracing::info!(
                    output = %output.display(),
                    spectra = summary.spectra,
                    rows = summary.rows,
                    "conversion finished"
                );
                ConversionEvent::Finished {
                    success: true,
                    message: format!(
                        "Converted {} spectra ({} rows) to {}",
                        summary.spectra,
                        summary.rows,
                        output.display()
                    ),
                    output: Some(output),
                }
            }
            Err(e) => {
                tracing::warn!(input = %input.display(), "conversion failed: {}", e);
                ConversionEvent::Finished {
                    success: false,
                    message: e.user_message(),
                    output: None,
                }
            }
        };
        let _ = tx.send(finished);
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Drain pending events without blocking
    pub fn poll(&mut self) -> Vec<ConversionEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.push(event, &mut events),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected(&mut events);
                    break;
                }
            }
        }
        events
    }

    /// Block until the worker is done and return every remaining event
    pub fn wait(&mut self) -> Vec<ConversionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.recv() {
            self.push(event, &mut events);
        }
        self.disconnected(&mut events);
        events
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn push(&mut self, event: ConversionEvent, events: &mut Vec<ConversionEvent>) {
        if matches!(event, ConversionEvent::Finished { .. }) {
            self.finished = true;
        }
        events.push(event);
    }

    /// A worker that died without reporting still yields one terminal event
    fn disconnected(&mut self, events: &mut Vec<ConversionEvent>) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        if !self.finished {
            self.finished = true;
            events.push(ConversionEvent::Finished {
                success: false,
                message: "Conversion worker stopped unexpectedly".to_string(),
                output: None,
            });
        }
    }
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::mzml::fixtures;
    use crate::data::Peak;
    use tempfile::tempdir;

    fn finished(events: &[ConversionEvent]) -> Vec<&ConversionEvent> {
        events
            .iter()
            .filter(|e| matches!(e, ConversionEvent::Finished { .. }))
            .collect()
    }

    #[test]
    fn test_timestamp_prefix() {
        let line = timestamped("hello");
        assert!(line.starts_with('['));
        assert_eq!(&line[9..], "] hello");
    }

    #[test]
    fn test_output_path_replaces_extension() {
        assert_eq!(
            output_path(Path::new("/data/run01.mzML")),
            PathBuf::from("/data/run01.parquet")
        );
    }

    #[test]
    fn test_converts_small_run() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("run.mzML");
        std::fs::write(&input, fixtures::small_run()).unwrap();

        let mut job = ConversionJob::spawn(input.clone());
        let events = job.wait();
        assert!(job.is_finished());

        let terminal = finished(&events);
        assert_eq!(terminal.len(), 1);
        assert!(matches!(events.last(), Some(ConversionEvent::Finished { .. })));
        let output = match terminal[0] {
            ConversionEvent::Finished {
                success: true,
                output: Some(output),
                ..
            } => output.clone(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(output, dir.path().join("run.parquet"));
        assert!(events.iter().any(|e| matches!(e, ConversionEvent::Progress(line) if line.starts_with('['))));

        let table = PeakTable::load(&output).unwrap();
        let df = table.dataframe();
        assert_eq!(table.height(), 6);
        assert_eq!(df.column("scan_number").unwrap().dtype(), &DataType::Int32);
        assert_eq!(df.column("ms_level").unwrap().dtype(), &DataType::Int32);

        let peaks = table.peaks().unwrap();
        assert_eq!(peaks[0], Peak::new(0, 400.0, 1000.0, 1));
        assert_eq!(peaks[2], Peak::new(1, 150.5, 30.0, 2).with_precursor(500.25));
        assert_eq!(peaks[5].scan_number, 2);
        assert_eq!(peaks[5].precursor_mz, None);
    }

    #[test]
    fn test_malformed_input_fails_once() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.mzML");
        std::fs::write(&input, "<mzML><spectrum index=\"x\"></spectrum></mzML>").unwrap();

        let mut job = ConversionJob::spawn(input);
        let events = job.wait();
        let terminal = finished(&events);
        assert_eq!(terminal.len(), 1);
        assert!(matches!(
            terminal[0],
            ConversionEvent::Finished {
                success: false,
                output: None,
                ..
            }
        ));
        assert!(!dir.path().join("broken.parquet").exists());
    }

    #[test]
    fn test_missing_input_fails_once() {
        let dir = tempdir().unwrap();
        let mut job = ConversionJob::spawn(dir.path().join("absent.mzML"));
        let mut events = Vec::new();
        while !job.is_finished() {
            events.extend(job.poll());
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(finished(&events).len(), 1);
        assert!(job.poll().is_empty());
    }
}

//! Deferred checkpoint persistence.
//!
//! The engine only emits [`Checkpoint`] values; writing them is this
//! collaborator's job. A worker thread drains a channel so persistence
//! never gates the next generation, and `finish` joins it so everything
//! queued is on disk before the process exits.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use super::search::{Checkpoint, CheckpointSink};

/// Writes checkpoints as JSON lines on a worker thread.
pub struct CheckpointWriter {
    tx: Sender<Checkpoint>,
    worker: JoinHandle<io::Result<()>>,
}

impl CheckpointWriter {
    /// Create the output file and start the worker.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        let (tx, rx) = mpsc::channel::<Checkpoint>();
        let worker = thread::spawn(move || {
            let mut out = BufWriter::new(file);
            for checkpoint in rx {
                serde_json::to_writer(&mut out, &checkpoint).map_err(io::Error::from)?;
                out.write_all(b"\n")?;
            }
            out.flush()
        });
        Ok(Self { tx, worker })
    }

    /// A sink to attach to the engine; sending never blocks.
    pub fn sink(&self) -> CheckpointSink {
        let tx = self.tx.clone();
        Box::new(move |checkpoint| {
            // A failed send means the writer already finished; the
            // checkpoint has nowhere to go.
            let _ = tx.send(checkpoint);
        })
    }

    /// Close the queue, wait for pending writes, and surface any error.
    pub fn finish(self) -> io::Result<()> {
        let Self { tx, worker } = self;
        drop(tx);
        worker
            .join()
            .map_err(|_| io::Error::other("checkpoint writer panicked"))?
    }
}

//! Output sinks for discovered primes.
use std::io::{self, Write};
use std::sync::Mutex;

use crate::error::SieveError;

/// Receives each prime as soon as its stage (or the driver) knows it.
pub trait PrimeSink: Send + Sync {
    fn emit(&self, prime: u32) -> Result<(), SieveError>;
}

/// Writes one `prime <N>` line per prime and flushes after each.
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> PrimeSink for WriterSink<W> {
    fn emit(&self, prime: u32) -> Result<(), SieveError> {
        // Blocking write on the calling worker thread: a slow reader stalls that
        // thread until the line is flushed, which keeps output in emission order.
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "prime {}", prime)
            .and_then(|_| out.flush())
            .map_err(|source| SieveError::Output { prime, source })
    }
}

/// Collects primes in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    primes: Mutex<Vec<u32>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primes(&self) -> Vec<u32> {
        self.primes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl PrimeSink for MemorySink {
    fn emit(&self, prime: u32) -> Result<(), SieveError> {
        self.primes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(prime);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_sink_line_format() {
        let sink = WriterSink::new(Vec::new());
        sink.emit(2).unwrap();
        sink.emit(3).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "prime 2\nprime 3\n");
    }

    #[test]
    fn test_writer_sink_failure_is_write_failure() {
        let sink = WriterSink::new(BrokenPipe);
        let err = sink.emit(5).unwrap_err();
        assert!(matches!(err, SieveError::Output { prime: 5, .. }));
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        for prime in [2, 3, 5] {
            sink.emit(prime).unwrap();
        }
        assert_eq!(sink.primes(), vec![2, 3, 5]);
    }
}

//! In-memory link for deterministic tests of the connection manager.
//!
//! A [`ScriptHandle`] is shared between the test and every link opened from
//! it, so the test can queue inbound chunks and faults and inspect what was
//! written after the link has been moved into the manager.

use crate::serial_link::{LinkDevice, LinkOpener};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Script {
    reads: VecDeque<io::Result<Vec<u8>>>,
    writes: Vec<Vec<u8>>,
    fail_writes: bool,
    refuse_open: Option<String>,
    opened: Vec<(String, u32)>,
    live_links: usize,
    read_calls: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptHandle(Arc<Mutex<Script>>);

impl ScriptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.0.lock().unwrap()
    }

    /// Queue one chunk for a single future read.
    pub fn feed(&self, bytes: &[u8]) {
        self.lock().reads.push_back(Ok(bytes.to_vec()));
    }

    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.lock()
            .reads
            .push_back(Err(io::Error::new(kind, "device disconnected")));
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn refuse_open(&self, reason: Option<&str>) {
        self.lock().refuse_open = reason.map(str::to_string);
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    pub fn written_text(&self) -> Vec<String> {
        self.writes()
            .into_iter()
            .map(|w| String::from_utf8_lossy(&w).into_owned())
            .collect()
    }

    pub fn opened(&self) -> Vec<(String, u32)> {
        self.lock().opened.clone()
    }

    pub fn live_links(&self) -> usize {
        self.lock().live_links
    }

    pub fn read_calls(&self) -> usize {
        self.lock().read_calls
    }

    pub fn opener(&self) -> ScriptedOpener {
        ScriptedOpener(self.clone())
    }
}

pub struct ScriptedLink(ScriptHandle);

impl LinkDevice for ScriptedLink {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut script = self.0.lock();
        script.read_calls += 1;
        match script.reads.pop_front() {
            None => Ok(0),
            Some(Err(e)) => Err(e),
            Some(Ok(chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    script.reads.push_front(Ok(chunk[n..].to_vec()));
                }
                Ok(n)
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut script = self.0.lock();
        if script.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write refused"));
        }
        script.writes.push(bytes.to_vec());
        Ok(())
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        self.0.lock().live_links -= 1;
    }
}

pub struct ScriptedOpener(ScriptHandle);

impl LinkOpener for ScriptedOpener {
    fn open(&mut self, port: &str, baud: u32) -> anyhow::Result<Box<dyn LinkDevice>> {
        let mut script = self.0.lock();
        if let Some(reason) = &script.refuse_open {
            anyhow::bail!("failed to open serial port {port}: {reason}");
        }
        script.opened.push((port.to_string(), baud));
        script.live_links += 1;
        drop(script);
        Ok(Box::new(ScriptedLink(self.0.clone())))
    }
}

/// Lines longer than this are dropped whole once their terminator shows up.
pub const MAX_LINE_BYTES: usize = 4096;

/// Splits the raw serial byte stream into trimmed text lines.
///
/// Bytes are held until a `\n` arrives, so a line split across any number of
/// reads comes out exactly once. Invalid UTF-8 inside a line is dropped rather
/// than failing the line.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    /// Bytes pushed but not yet scanned for a terminator.
    unscanned: Vec<u8>,
    /// The line being assembled, capped at `MAX_LINE_BYTES`.
    line: Vec<u8>,
    overflowed: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            unscanned: Vec::new(),
            line: Vec::with_capacity(256),
            overflowed: false,
        }
    }

    /// Append a chunk and iterate over every line now complete.
    ///
    /// The iterator is lazy: anything it has not reached when dropped stays
    /// queued for the next `push`.
    pub fn push(&mut self, chunk: &[u8]) -> FrameLines<'_> {
        self.unscanned.extend_from_slice(chunk);
        FrameLines {
            buffer: self,
            cursor: 0,
        }
    }

    /// Drop any partial line, e.g. when the link is torn down.
    pub fn reset(&mut self) {
        self.unscanned.clear();
        self.line.clear();
        self.overflowed = false;
    }

    pub fn pending_len(&self) -> usize {
        self.unscanned.len() + self.line.len()
    }

    fn extend_line(&mut self, from: usize, to: usize) {
        if self.overflowed {
            return;
        }
        let bytes = &self.unscanned[from..to];
        if self.line.len() + bytes.len() > MAX_LINE_BYTES {
            self.line.clear();
            self.overflowed = true;
        } else {
            self.line.extend_from_slice(bytes);
        }
    }

    /// Close the current line; `None` when it is blank or was overlong.
    fn take_line(&mut self) -> Option<String> {
        let overflowed = std::mem::replace(&mut self.overflowed, false);
        let raw = std::mem::take(&mut self.line);
        if overflowed {
            tracing::warn!("dropping serial line longer than {MAX_LINE_BYTES} bytes");
            return None;
        }

        let mut text = String::with_capacity(raw.len());
        for chunk in raw.utf8_chunks() {
            text.push_str(chunk.valid());
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

pub struct FrameLines<'a> {
    buffer: &'a mut FrameBuffer,
    cursor: usize,
}

impl Iterator for FrameLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let rest = &self.buffer.unscanned[self.cursor..];
            let Some(offset) = rest.iter().position(|&b| b == b'\n') else {
                let end = self.buffer.unscanned.len();
                self.buffer.extend_line(self.cursor, end);
                self.cursor = end;
                return None;
            };

            let end = self.cursor + offset;
            self.buffer.extend_line(self.cursor, end);
            self.cursor = end + 1;
            if let Some(line) = self.buffer.take_line() {
                return Some(line);
            }
        }
    }
}

impl Drop for FrameLines<'_> {
    fn drop(&mut self) {
        self.buffer.unscanned.drain(..self.cursor);
    }
}

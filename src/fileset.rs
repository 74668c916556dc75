//! Byte positions and the file set they live in.
//!
//! Analysis spans the whole program, so positions are not per-file byte
//! offsets: every source file is registered in a [`FileSet`] and receives a
//! base offset, and a [`Pos`] is a single integer addressing a byte in any
//! registered file. The snapshot provider builds the set; this crate only
//! reads it back into (path, line, character) triples.

use memchr::memchr_iter;

/// A byte position within a [`FileSet`].
///
/// Positions are 1-based so that `Pos::NONE` (zero) can mean "no position".
/// Builtins and other synthesized declarations carry `Pos::NONE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos(pub u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub fn is_valid(self) -> bool {
        self != Pos::NONE
    }
}

/// One source file registered in a [`FileSet`].
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path of the file. Empty for synthesized sources that have
    /// no concrete file behind them (builtins).
    path: String,
    /// Base offset of this file inside the set; the file covers positions
    /// `base ..= base + size`.
    base: u32,
    size: u32,
    /// Byte offset of the first character of every line.
    line_starts: Vec<u32>,
}

impl SourceFile {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.is_valid() && pos.0 >= self.base && pos.0 <= self.base + self.size
    }

    /// Convert a zero-based byte offset into this file to a set-wide [`Pos`].
    pub fn pos(&self, offset: u32) -> Pos {
        Pos(self.base + offset.min(self.size))
    }

    /// Convert a [`Pos`] inside this file into a zero-based
    /// (line, character) pair.
    pub fn line_col(&self, pos: Pos) -> (u32, u32) {
        let offset = pos.0.saturating_sub(self.base).min(self.size);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line as u32, offset - self.line_starts[line])
    }
}

/// The set of all source files known to one program snapshot.
#[derive(Debug, Clone)]
pub struct FileSet {
    files: Vec<SourceFile>,
    next_base: u32,
}

impl FileSet {
    pub fn new() -> Self {
        // Base 1 keeps Pos(0) free as the invalid position.
        Self {
            files: Vec::new(),
            next_base: 1,
        }
    }

    /// Register `content` under `path` and index its line starts.
    /// Returns the index of the new file within the set.
    pub fn add_file(&mut self, path: &str, content: &str) -> usize {
        let bytes = content.as_bytes();
        let mut line_starts = vec![0u32];
        for nl in memchr_iter(b'\n', bytes) {
            line_starts.push(nl as u32 + 1);
        }
        let file = SourceFile {
            path: path.to_string(),
            base: self.next_base,
            size: bytes.len() as u32,
            line_starts,
        };
        self.next_base = self.next_base + file.size + 1;
        self.files.push(file);
        self.files.len() - 1
    }

    pub fn file(&self, index: usize) -> &SourceFile {
        &self.files[index]
    }

    /// The file whose span contains `pos`, if any.
    pub fn file_containing(&self, pos: Pos) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.contains(pos))
    }
}

impl Default for FileSet {
    fn default() -> Self {
        Self::new()
    }
}

//! `apktool.yml` doNotCompress handling
//!
//! apktool records every file extension that must be stored uncompressed in a
//! `doNotCompress:` list inside `apktool.yml`. When split APKs are merged, the
//! primary package has to carry the union of all those lists, otherwise
//! resources coming from a secondary package (native libraries, raw assets)
//! get compressed on rebuild.
//!
//! The file is treated as plain lines rather than YAML so that everything
//! outside the block is written back byte for byte.

use crate::error::MergeResult;
use std::collections::BTreeSet;
use std::fs;
use std::ops::Range;
use std::path::Path;

/// Name of the decoder config file at the root of a decoded tree
pub const APKTOOL_CONFIG_FILE: &str = "apktool.yml";

/// Line that opens the block
pub const BLOCK_MARKER: &str = "doNotCompress:";

/// Prefix of every member line
pub const ENTRY_PREFIX: &str = "- ";

/// Position of the doNotCompress members inside the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBounds {
    /// Index of the first member line (the line after the marker)
    pub start: usize,
    /// Index of the last member line, one before the line that closes the block.
    /// For an empty block this is the marker line itself.
    pub end: usize,
}

impl BlockBounds {
    /// Range of lines holding members. `end` is inclusive, so the last
    /// member is replaced along with the rest when splicing.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end + 1
    }
}

/// Parsed `apktool.yml` with its doNotCompress block located
#[derive(Debug, Clone, Default)]
pub struct ApktoolConfig {
    /// All lines, each keeping its own terminator
    lines: Vec<String>,
    /// Block members, sorted
    entries: Vec<String>,
    bounds: Option<BlockBounds>,
}

impl ApktoolConfig {
    /// Parse config text
    pub fn parse(text: &str) -> Self {
        let lines = text.split_inclusive('\n').map(str::to_string).collect();
        Self::from_lines(lines)
    }

    /// Build from an already split line sequence
    pub fn from_lines(lines: Vec<String>) -> Self {
        let (entries, bounds) = locate_block(&lines);
        Self {
            lines,
            entries,
            bounds,
        }
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> MergeResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Full line sequence
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Sorted doNotCompress members (empty when there is no block)
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Block position, `None` when the marker never appears
    pub fn bounds(&self) -> Option<BlockBounds> {
        self.bounds
    }

    /// Fold `extra` members into the block.
    ///
    /// The block becomes the sorted, deduplicated union of its current members
    /// and `extra`, spliced back where the old members were. Returns `false`
    /// without touching anything when the file has no block.
    pub fn merge_entries<I, S>(&mut self, extra: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(bounds) = self.bounds else {
            return false;
        };

        let merged: BTreeSet<String> = self
            .entries
            .iter()
            .map(|line| terminated(line))
            .chain(extra.into_iter().map(|line| terminated(line.as_ref())))
            .collect();
        let merged: Vec<String> = merged.into_iter().collect();

        let marker = &mut self.lines[bounds.start - 1];
        if !merged.is_empty() && !marker.ends_with('\n') {
            marker.push('\n');
        }
        self.lines.splice(bounds.range(), merged.iter().cloned());
        self.bounds = Some(BlockBounds {
            start: bounds.start,
            end: bounds.start + merged.len() - 1,
        });
        self.entries = merged;
        true
    }

    /// Render the file contents
    pub fn to_text(&self) -> String {
        self.lines.concat()
    }

    /// Overwrite `path` with the current contents
    pub fn save(&self, path: &Path) -> MergeResult<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }
}

/// Merge `extra` members into the config file at `path`.
///
/// The file is re-read on every call, so calling this once per secondary
/// package folds all of them into the primary. Returns the number of members
/// in the block afterwards.
pub fn merge_into_file<S: AsRef<str>>(path: &Path, extra: &[S]) -> MergeResult<usize> {
    let mut config = ApktoolConfig::load(path)?;
    if !config.merge_entries(extra) {
        tracing::warn!(
            "No {} block in {}, nothing merged",
            BLOCK_MARKER,
            path.display()
        );
        return Ok(0);
    }
    config.save(path)?;
    Ok(config.entries().len())
}

fn locate_block(lines: &[String]) -> (Vec<String>, Option<BlockBounds>) {
    let Some(marker) = lines.iter().position(|line| line.starts_with(BLOCK_MARKER)) else {
        return (Vec::new(), None);
    };

    let start = marker + 1;
    let mut entries: Vec<String> = lines[start..]
        .iter()
        .take_while(|line| line.starts_with(ENTRY_PREFIX))
        .cloned()
        .collect();
    let end = start + entries.len() - 1;
    entries.sort();

    (entries, Some(BlockBounds { start, end }))
}

/// A member taken from the last line of a file may lack its newline
fn terminated(line: &str) -> String {
    if line.ends_with('\n') {
        line.to_string()
    } else {
        format!("{}\n", line)
    }
}

//! Name Deduplication Index
//!
//! Builds the two name sections of a log file:
//!
//! - **username_set**: one `(offset, size)` record per distinct name, pointing
//!   into the concatenated name bytes (`username_data`)
//! - **username_list**: for every line, the index of its author in
//!   `username_set`, found by binary search over the sorted names
//!
//! The binary search only works over strictly ascending names, so `build`
//! checks that precondition instead of trusting the caller.

use chatlog_core::{Error, Log, Result};

/// One `username_set` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRecord {
    /// Offset into the name bytes
    pub offset: u64,
    /// Length in bytes
    pub size: u64,
}

/// Name table plus per-line indices into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupIndex {
    /// One record per distinct name, in name order
    pub records: Vec<NameRecord>,

    /// Total length of all name bytes
    pub data_len: u64,

    /// Index into `records` for every line, in line order
    pub line_indices: Vec<u64>,
}

impl DedupIndex {
    /// Index the names and lines of a log
    pub fn from_log(log: &Log) -> Result<Self> {
        let names: Vec<&str> = log.names().collect();
        Self::build(&names, log.lines().map(|line| line.name()))
    }

    /// Build from strictly ascending `names` and each line's author
    pub fn build<'a>(
        names: &[&str],
        line_names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        if let Some(pair) = names.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(Error::invariant(format!(
                "names must be strictly ascending, found {:?} before {:?}",
                pair[0], pair[1]
            )));
        }

        let mut records = Vec::with_capacity(names.len());
        let mut data_len = 0u64;
        for name in names {
            records.push(NameRecord {
                offset: data_len,
                size: name.len() as u64,
            });
            data_len += name.len() as u64;
        }

        let line_indices = line_names
            .into_iter()
            .enumerate()
            .map(|(line, name)| {
                names
                    .binary_search(&name)
                    .map(|index| index as u64)
                    .map_err(|_| {
                        Error::invariant(format!(
                            "line {} author {:?} is not in the name table",
                            line, name
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            records,
            data_len,
            line_indices,
        })
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

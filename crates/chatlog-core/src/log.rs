//! The Log Aggregate
//!
//! A `Log` owns one text buffer plus the spans that describe what lives in it:
//!
//! - **names**: the deduplicated author names, strictly ascending
//! - **lines**: one `LineSpan` per chat line, in order
//!
//! Every name view and every message view of a log aliases this single buffer.
//! Accessors hand out `&str` and `LineView<'_>` borrowed from `&Log`, so no
//! view can outlive the buffer.
//!
//! ## Invariants
//!
//! Checked once by `Log::new`, which fails with `InvariantViolation`:
//! 1. Every span lies inside the buffer on character boundaries
//! 2. Names are strictly ascending (sorted, no duplicates)
//! 3. Every line's name text equals exactly one entry of the name table
//!
//! After construction a log is immutable; it can only be moved.
//!
//! ## Building a Log
//!
//! Producers assembling fetched transcript lines use `LogBuilder`, which sorts
//! and deduplicates names so the invariants hold by construction:
//!
//! ```ignore
//! let mut builder = LogBuilder::new(LogIdentifier::channel("dota2", TimePeriod::month(2018, 9)?));
//! builder.push(t1, "bob", "hello");
//! builder.push(t2, "alice", "hi bob");
//! let log = builder.build()?;
//!
//! assert_eq!(log.names().collect::<Vec<_>>(), ["alice", "bob"]);
//! ```

use crate::identifier::LogIdentifier;
use crate::line::{LineSpan, LineView, TextSpan};
use crate::time::TimePoint;
use crate::{Error, Result};

/// A complete in-memory log.
///
/// Immutable once built. `Clone` is deliberate: spans are relative to the
/// buffer, so a clone's views resolve into its own copy of the bytes.
#[derive(Debug, Clone)]
pub struct Log {
    id: LogIdentifier,

    /// Owns every byte the name and line spans refer to
    buffer: String,

    /// Sorted, duplicate-free name table
    names: Vec<TextSpan>,

    lines: Vec<LineSpan>,
}

impl Log {
    /// Assemble a log from its parts, checking all invariants
    pub fn new(
        id: LogIdentifier,
        buffer: String,
        names: Vec<TextSpan>,
        lines: Vec<LineSpan>,
    ) -> Result<Self> {
        let mut previous: Option<&str> = None;
        for (i, span) in names.iter().enumerate() {
            let name = span
                .resolve(&buffer)
                .ok_or_else(|| Error::invariant(format!("name {} has invalid span {:?}", i, span)))?;

            if let Some(prev) = previous {
                if prev >= name {
                    return Err(Error::invariant(format!(
                        "names are not strictly ascending: {:?} followed by {:?}",
                        prev, name
                    )));
                }
            }
            previous = Some(name);
        }

        for (i, line) in lines.iter().enumerate() {
            let name = line.name.resolve(&buffer).ok_or_else(|| {
                Error::invariant(format!("line {} has invalid name span {:?}", i, line.name))
            })?;
            line.message.resolve(&buffer).ok_or_else(|| {
                Error::invariant(format!(
                    "line {} has invalid message span {:?}",
                    i, line.message
                ))
            })?;

            let found = names.binary_search_by(|span| {
                // Spans were resolved above
                span.resolve(&buffer).unwrap_or_default().cmp(name)
            });
            if found.is_err() {
                return Err(Error::invariant(format!(
                    "line {} author {:?} is missing from the name table",
                    i, name
                )));
            }
        }

        Ok(Self {
            id,
            buffer,
            names,
            lines,
        })
    }

    pub fn id(&self) -> &LogIdentifier {
        &self.id
    }

    /// The buffer every view aliases
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Number of distinct names
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Names in ascending order
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.names.iter().map(move |span| self.text(span))
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|span| self.text(span))
    }

    pub fn name_spans(&self) -> &[TextSpan] {
        &self.names
    }

    /// Index of `name` in the name table, by binary search
    pub fn find_name(&self, name: &str) -> Option<usize> {
        self.names
            .binary_search_by(|span| self.text(span).cmp(name))
            .ok()
    }

    /// Number of lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in their original order
    pub fn lines(&self) -> impl ExactSizeIterator<Item = LineView<'_>> + '_ {
        self.lines.iter().map(move |line| self.view(line))
    }

    pub fn line(&self, index: usize) -> Option<LineView<'_>> {
        self.lines.get(index).map(|line| self.view(line))
    }

    pub fn line_spans(&self) -> &[LineSpan] {
        &self.lines
    }

    fn view(&self, line: &LineSpan) -> LineView<'_> {
        LineView::new(line.time, self.text(&line.name), self.text(&line.message))
    }

    fn text(&self, span: &TextSpan) -> &str {
        // Spans are validated in `new` and the buffer never changes afterwards
        span.resolve(&self.buffer).unwrap_or_default()
    }
}

impl PartialEq for Log {
    /// Logs are equal when their identifiers and ordered lines match by value
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.lines.len() == other.lines.len() && self.lines().eq(other.lines())
    }
}

impl Eq for Log {}

/// Assembles a `Log` from lines in arrival order
#[derive(Debug, Clone)]
pub struct LogBuilder {
    id: LogIdentifier,
    lines: Vec<(TimePoint, String, String)>,
}

impl LogBuilder {
    pub fn new(id: LogIdentifier) -> Self {
        Self {
            id,
            lines: Vec::new(),
        }
    }

    /// Append a line
    pub fn push(
        &mut self,
        time: TimePoint,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> &mut Self {
        self.lines.push((time, name.into(), message.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sort and deduplicate names, lay out the buffer and build the log
    pub fn build(self) -> Result<Log> {
        let mut unique: Vec<&str> = self.lines.iter().map(|(_, name, _)| name.as_str()).collect();
        unique.sort_unstable();
        unique.dedup();

        let capacity = unique.iter().map(|name| name.len()).sum::<usize>()
            + self.lines.iter().map(|(_, _, message)| message.len()).sum::<usize>();
        let mut buffer = String::with_capacity(capacity);

        let mut names = Vec::with_capacity(unique.len());
        for name in &unique {
            names.push(TextSpan::new(buffer.len(), name.len()));
            buffer.push_str(name);
        }

        let mut lines = Vec::with_capacity(self.lines.len());
        for (time, name, message) in &self.lines {
            let index = unique
                .binary_search_by(|candidate| candidate.cmp(&name.as_str()))
                .map_err(|_| Error::invariant(format!("author {:?} lost during dedup", name)))?;

            let message_span = TextSpan::new(buffer.len(), message.len());
            buffer.push_str(message);
            lines.push(LineSpan::new(*time, names[index], message_span));
        }

        Log::new(self.id, buffer, names, lines)
    }
}

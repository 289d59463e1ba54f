//! Lines and Text Views
//!
//! A line of chat is a time point, an author name and a message. This module
//! defines three representations of it:
//!
//! - **`LineView<'a>`**: borrowed `&str` views into some owner's buffer (a `Log`
//!   or a `Line`). The lifetime ties the view to its owner, so a view can never
//!   outlive the bytes it reads. Equality compares text and time, never
//!   addresses.
//! - **`Line`**: a self-contained line that owns its text. Name and message are
//!   stored as owner-relative spans, so cloning or moving a `Line` keeps both
//!   views correct without any fix-up.
//! - **`LineSpan`**: the span form a `Log` stores internally, resolved against
//!   the log's buffer on access.
//!
//! ## Why spans instead of pointers?
//!
//! A span is `(offset, len)` relative to the start of its owner's buffer. When
//! the buffer is duplicated the span is still right, because it never referred
//! to an address in the first place.

use crate::time::TimePoint;

/// A byte range `[offset, offset + len)` inside an owner's text buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextSpan {
    offset: usize,
    len: usize,
}

impl TextSpan {
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// End of the range, or None if it overflows
    pub fn checked_end(&self) -> Option<usize> {
        self.offset.checked_add(self.len)
    }

    /// The same range moved `by` bytes further into the buffer
    pub fn shifted(&self, by: usize) -> Option<Self> {
        Some(Self::new(self.offset.checked_add(by)?, self.len))
    }

    /// Resolve against `text`. None if out of bounds or not on char boundaries.
    pub fn resolve<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.offset..self.checked_end()?)
    }
}

/// Span form of a line stored inside a `Log`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub time: TimePoint,
    pub name: TextSpan,
    pub message: TextSpan,
}

impl LineSpan {
    pub fn new(time: TimePoint, name: TextSpan, message: TextSpan) -> Self {
        Self {
            time,
            name,
            message,
        }
    }
}

/// A borrowed view of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineView<'a> {
    time: TimePoint,
    name: &'a str,
    message: &'a str,
}

impl<'a> LineView<'a> {
    pub fn new(time: TimePoint, name: &'a str, message: &'a str) -> Self {
        Self {
            time,
            name,
            message,
        }
    }

    pub fn time(&self) -> TimePoint {
        self.time
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn message(&self) -> &'a str {
        self.message
    }
}

/// A line that owns its text
#[derive(Debug, Clone)]
pub struct Line {
    /// Name bytes followed by message bytes
    data: String,
    time: TimePoint,
    name: TextSpan,
    message: TextSpan,
}

impl Line {
    pub fn new(time: TimePoint, name: &str, message: &str) -> Self {
        let mut data = String::with_capacity(name.len() + message.len());
        data.push_str(name);
        data.push_str(message);

        Self {
            data,
            time,
            name: TextSpan::new(0, name.len()),
            message: TextSpan::new(name.len(), message.len()),
        }
    }

    pub fn time(&self) -> TimePoint {
        self.time
    }

    pub fn name(&self) -> &str {
        &self.data[self.name.offset..self.name.offset + self.name.len]
    }

    pub fn message(&self) -> &str {
        &self.data[self.message.offset..self.message.offset + self.message.len]
    }

    /// Span of the message inside `data()`
    pub fn message_span(&self) -> TextSpan {
        self.message
    }

    /// Span of the name inside `data()`
    pub fn name_span(&self) -> TextSpan {
        self.name
    }

    /// The owned buffer both views point into
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Borrow this line as a view
    pub fn view(&self) -> LineView<'_> {
        LineView::new(self.time, self.name(), self.message())
    }
}

impl From<LineView<'_>> for Line {
    fn from(view: LineView<'_>) -> Self {
        Line::new(view.time(), view.name(), view.message())
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl Eq for Line {}

//! Chatlog Core
//!
//! Value and view types shared by every chatlog crate:
//!
//! - [`TimePeriod`] / [`TimePoint`]: when a log and its lines happened
//! - [`LogIdentifier`]: channel, period and optional user of a log
//! - [`LineView`] / [`Line`]: borrowed and owned chat lines
//! - [`Log`] / [`LogBuilder`]: one buffer plus the name and line views into it
//! - [`Error`] / [`Result`]: the codec error taxonomy

pub mod error;
pub mod identifier;
pub mod line;
pub mod log;
pub mod time;

pub use error::{Error, Result};
pub use identifier::LogIdentifier;
pub use line::{Line, LineSpan, LineView, TextSpan};
pub use log::{Log, LogBuilder};
pub use time::{TimePeriod, TimePoint};

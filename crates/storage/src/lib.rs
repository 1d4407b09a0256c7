#![forbid(unsafe_code)]

mod db;
mod executor;
mod stream;

pub use db::{Db, GroupRead};
pub use stream::{ConsumerGroup, Fields, PendingEntry, Stream, StreamId, TrimBound, TrimPlan};

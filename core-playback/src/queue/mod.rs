//! Queue sources and the controller that installs them.

pub mod controller;
pub mod provider;

pub use controller::{InsertPosition, QueueController};
pub use provider::{EmptyQueue, GroupingQueue, ListQueue, QueueProvider};

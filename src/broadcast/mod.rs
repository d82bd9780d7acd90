//! Bulk publish driven by a bounded worker pool

pub mod dispatcher;

pub use dispatcher::{
    BroadcastDispatcher, BroadcastEvent, BroadcastHandle, BroadcastJob, BroadcastRequest, Publisher,
};

#![allow(unused_imports)]

mod recording_sink;

pub use recording_sink::{FailingSink, RecordingSink, StalledSink};

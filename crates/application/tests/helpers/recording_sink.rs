#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use wiredns_application::ReplySink;
use wiredns_domain::{Message, TransportError};

/// Collects every frame handed to it; clones share the same buffer.
#[derive(Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn ReplySink> {
        Box::new(self.clone())
    }

    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().unwrap().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn only_message(&self) -> Message {
        let frames = self.frames();
        assert_eq!(frames.len(), 1, "expected exactly one frame");
        Message::from_wire(&frames[0]).unwrap()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send_bytes(&mut self, wire: Vec<u8>) -> Result<(), TransportError> {
        self.frames.lock().unwrap().push(wire);
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl ReplySink for FailingSink {
    async fn send_bytes(&mut self, _wire: Vec<u8>) -> Result<(), TransportError> {
        Err(TransportError::Closed {
            server: "udp://127.0.0.1:5353".to_string(),
        })
    }
}

/// Accepts a frame and never finishes writing it, like a peer that stopped
/// reading.
pub struct StalledSink;

#[async_trait]
impl ReplySink for StalledSink {
    async fn send_bytes(&mut self, _wire: Vec<u8>) -> Result<(), TransportError> {
        std::future::pending().await
    }
}

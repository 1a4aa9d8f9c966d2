//! Result polling for work running off the GUI thread.

use anyhow::{anyhow, Result};
use std::sync::mpsc::{Receiver, TryRecvError};

/// Handle to one background task; the GUI polls it once per frame.
pub struct AsyncJob<T> {
    receiver: Option<Receiver<Result<T>>>,
}

impl<T> AsyncJob<T> {
    pub fn new(receiver: Receiver<Result<T>>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Returns the result exactly once, when the task has finished.
    /// A worker that exits without reporting yields an error.
    pub fn poll(&mut self) -> Option<Result<T>> {
        let result = match self.receiver.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(anyhow!("Background task ended without a result")),
        };
        self.receiver = None;
        Some(result)
    }

    pub fn is_running(&self) -> bool {
        self.receiver.is_some()
    }
}

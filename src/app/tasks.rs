use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use crate::kg::FetchError;

type Delivery<T> = (u64, Result<T, FetchError>);

/// Background request slot where only the most recently spawned job may
/// deliver. Each spawn takes a new epoch; results carrying an older epoch are
/// discarded when polled.
pub(in crate::app) struct LatestOnly<T> {
    name: &'static str,
    epoch: u64,
    in_flight: bool,
    tx: Sender<Delivery<T>>,
    rx: Receiver<Delivery<T>>,
}

impl<T: Send + 'static> LatestOnly<T> {
    pub(in crate::app) fn new(name: &'static str) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            name,
            epoch: 0,
            in_flight: false,
            tx,
            rx,
        }
    }

    pub(in crate::app) fn spawn<F>(&mut self, job: F) -> u64
    where
        F: FnOnce() -> Result<T, FetchError> + Send + 'static,
    {
        self.epoch = self.epoch.wrapping_add(1);
        self.in_flight = true;

        let epoch = self.epoch;
        let tx = self.tx.clone();
        let name = self.name;
        thread::spawn(move || {
            let result = job();
            if tx.send((epoch, result)).is_err() {
                tracing::debug!(task = name, epoch, "receiver dropped before delivery");
            }
        });

        epoch
    }

    /// Supersedes whatever is in flight without starting a new job.
    pub(in crate::app) fn cancel(&mut self) {
        if self.in_flight {
            tracing::debug!(task = self.name, epoch = self.epoch, "cancelling in-flight request");
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.in_flight = false;
    }

    #[cfg(test)]
    pub(in crate::app) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(in crate::app) fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub(in crate::app) fn poll(&mut self) -> Option<Result<T, FetchError>> {
        loop {
            match self.rx.try_recv() {
                Ok(delivery) => {
                    if let Some(result) = self.accept(delivery) {
                        return Some(result);
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    return self.in_flight.then(|| {
                        self.in_flight = false;
                        Err(FetchError::WorkerGone)
                    });
                }
            }
        }
    }

    fn accept(&mut self, (epoch, result): Delivery<T>) -> Option<Result<T, FetchError>> {
        if epoch != self.epoch || !self.in_flight {
            tracing::debug!(
                task = self.name,
                epoch,
                current = self.epoch,
                "discarding superseded response"
            );
            return None;
        }

        self.in_flight = false;
        Some(result)
    }

    #[cfg(test)]
    pub(in crate::app) fn wait(
        &mut self,
        timeout: std::time::Duration,
    ) -> Option<Result<T, FetchError>> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match self.rx.recv_timeout(remaining) {
                Ok(delivery) => {
                    if let Some(result) = self.accept(delivery) {
                        return Some(result);
                    }
                }
                Err(_) => return None,
            }
        }
    }
}

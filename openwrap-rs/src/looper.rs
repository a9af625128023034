//! Hand-off of work onto the owner's event loop.
//!
//! Ad slot listeners may touch UI state, so anything resolved on a timer task
//! is posted here and run by whichever loop owns the slot.
use tokio::sync::mpsc::{self, error::TryRecvError};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle used to post tasks to a [`MainLooper`].
#[derive(Clone, Debug)]
pub struct MainThread {
    tx: mpsc::UnboundedSender<Task>,
}

impl MainThread {
    /// Returns `false` if the looper has gone away and the task was dropped.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(task)).is_ok()
    }
}

pub struct MainLooper {
    rx: mpsc::UnboundedReceiver<Task>,
}

/// Creates a connected [`MainThread`] handle and its [`MainLooper`].
pub fn main_looper() -> (MainThread, MainLooper) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MainThread { tx }, MainLooper { rx })
}

impl MainLooper {
    /// Runs posted tasks until every [`MainThread`] handle is dropped.
    pub async fn run(mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
        tracing::debug!("main looper exiting");
    }

    /// Waits for and runs a single task. Returns `false` once all handles are dropped.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs every task that is already queued without waiting for more.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.rx.try_recv() {
                Ok(task) => {
                    task();
                    count += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return count,
            }
        }
    }
}

//! Event handling for the TUI

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, MouseEvent};
use futures::StreamExt;
use posgate_core::Principal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input
    Key(KeyEvent),
    /// Mouse input
    Mouse(MouseEvent),
    /// Terminal resized
    Resize,
    /// Terminal tick (for animations)
    Tick,
    /// Anonymous identity established
    IdentityReady(Principal),
    /// Anonymous identity could not be established
    IdentityFailed(String),
}

/// Merges terminal input, ticks and background results into one queue
pub struct EventHandler {
    /// Sender for events
    sender: mpsc::UnboundedSender<Event>,
    /// Receiver for events
    receiver: mpsc::UnboundedReceiver<Event>,
    /// Tick rate for animations
    tick_rate: Duration,
    /// Input and tick tasks, once started
    tasks: Vec<JoinHandle<()>>,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            tick_rate,
            tasks: Vec::new(),
        }
    }

    /// Get a clone of the sender for other tasks to send events
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    /// Start reading the terminal and generating ticks
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }

        let tick_tx = self.sender.clone();
        let tick_rate = self.tick_rate;
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_rate);
            loop {
                interval.tick().await;
                if tick_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        }));

        let input_tx = self.sender.clone();
        self.tasks.push(tokio::spawn(async move {
            let mut stream = EventStream::new();
            while let Some(event) = stream.next().await {
                let event = match event {
                    Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                    Ok(CrosstermEvent::Mouse(mouse)) => Event::Mouse(mouse),
                    Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("Terminal input error: {}", e);
                        break;
                    }
                };
                if input_tx.send(event).is_err() {
                    break;
                }
            }
        }));
    }

    /// Try to receive the next event (non-blocking)
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    /// Receive the next event
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

//! Structures to keep the process alive until some event occurs

use futures::{
    channel::mpsc::{channel, Receiver, Sender},
    pin_mut,
    prelude::*,
    select,
};
use log::{debug, error, warn};
use std::fmt;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};

/// Reason why the heart stopped beating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathReason {
    /// Internal kill signal has been sent
    Killed(String),
    /// SIGINT, SIGTERM or other process-external cause
    Terminated,
}

impl fmt::Display for DeathReason {
    fn fmt(&self, w: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::Killed(reason) => write!(w, "Killed ({})", reason),
            DeathReason::Terminated => write!(w, "Terminated due to external signal"),
        }
    }
}

/// Lifecycle management struct that can be used to keep the application alive
pub struct Heart {
    rx: Receiver<String>,
    // Keeps the channel open for hearts without a stone
    _own_stone: Option<HeartStone>,
}

impl Heart {
    /// Creates a new heart and linked stone
    pub fn new() -> (Self, HeartStone) {
        let (tx, rx) = channel(2);
        let heart = Self {
            rx,
            _own_stone: None,
        };

        (heart, HeartStone::new(tx))
    }

    /// Creates a new heart which only dies from external signals
    pub fn without_heart_stone() -> Self {
        let (mut heart, stone) = Heart::new();
        heart._own_stone = Some(stone);
        heart
    }

    /// Future that waits until the heart dies for the returned reason
    pub async fn death(&mut self) -> DeathReason {
        debug!("Heart starts beating");

        let termination = Heart::termination_signal().fuse();
        pin_mut!(termination);

        loop {
            select! {
                reason = self.rx.next() => match reason {
                    Some(reason) => return DeathReason::Killed(reason),
                    None => {
                        warn!("All heart stones have been dropped, waiting for external termination");
                        termination.as_mut().await;
                        return DeathReason::Terminated;
                    }
                },
                () = termination => return DeathReason::Terminated,
            };
        }
    }

    async fn termination_signal() {
        let ctrl_c = ctrl_c().fuse();
        pin_mut!(ctrl_c);

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm_stream) => {
                let sigterm = sigterm_stream.recv().fuse();
                pin_mut!(sigterm);

                select! {
                    _ = sigterm => {},
                    _ = ctrl_c => {},
                };
            }
            Err(e) => {
                warn!("Unable to listen for SIGTERM, relying on Ctrl-C only: {}", e);
                ctrl_c.await.ok();
            }
        }
    }
}

/// Remote controller for the heart
#[derive(Clone)]
pub struct HeartStone {
    remote: Sender<String>,
}

impl HeartStone {
    fn new(remote: Sender<String>) -> Self {
        Self { remote }
    }

    /// Kill the associated heart
    pub async fn kill(&mut self, reason: String) {
        if let Err(e) = self.remote.send(reason).await {
            error!("Failed to interact with Heart: {}", e);
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use futures::poll;
    use std::time::Duration;
    use tokio::task::{spawn, yield_now};
    use tokio::time::sleep;

    #[tokio::test]
    async fn live_until_killed() {
        let (mut heart, _stone) = Heart::new();

        let handle = spawn(async move { heart.death().await });
        sleep(Duration::from_millis(100)).await;
        yield_now().await;

        assert!(!poll!(handle).is_ready());
    }

    #[tokio::test]
    async fn die_when_killed() {
        let (mut heart, mut stone) = Heart::new();

        let handle = spawn(async move { heart.death().await });
        stone.kill("Testing".to_owned()).await;

        assert_eq!(
            handle.await.unwrap(),
            DeathReason::Killed("Testing".to_owned())
        );
    }

    #[tokio::test]
    async fn outlive_dropped_stones_without_own_stone() {
        let mut heart = Heart::without_heart_stone();

        let handle = spawn(async move { heart.death().await });
        sleep(Duration::from_millis(50)).await;
        yield_now().await;

        assert!(!poll!(handle).is_ready());
    }
}

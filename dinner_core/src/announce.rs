//! Announcements: the event stream from philosophers to the reporter.
//!
//! Any number of producers (one per philosopher, plus the coordinator)
//! push records into an unbounded channel drained by a single reporter
//! task. Records from one producer arrive in the order they were emitted;
//! there is no ordering between producers.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;

/// An immutable event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Name of the emitter
    pub from: String,

    /// Message text
    pub message: String,
}

impl std::fmt::Display for Announcement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<25}: {}", self.from, self.message)
    }
}

/// How much the run says.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// Only important announcements
    #[default]
    Quiet,

    /// Every announcement, including per-state dwell times
    Verbose,
}

impl Verbosity {
    /// Maps a verbose flag to a level.
    pub fn from_flag(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Quiet
        }
    }
}

/// Priority of a single announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Always delivered
    Important,

    /// Delivered only when verbose
    Detail,
}

/// Receives rendered announcements from the reporter.
pub trait AnnouncementSink: Send + 'static {
    /// Delivers one record.
    fn deliver(&mut self, announcement: Announcement);
}

impl AnnouncementSink for Vec<Announcement> {
    fn deliver(&mut self, announcement: Announcement) {
        self.push(announcement);
    }
}

/// Producer handle. Cheap to clone, one per philosopher.
#[derive(Debug, Clone)]
pub struct Announcer {
    tx: mpsc::UnboundedSender<Announcement>,
    verbosity: Verbosity,
}

impl Announcer {
    /// Emits an announcement, dropping it if it is below the verbosity level.
    ///
    /// Returns true if the record was handed to the reporter.
    pub fn announce(&self, priority: Priority, from: &str, message: impl Into<String>) -> bool {
        if priority == Priority::Detail && self.verbosity == Verbosity::Quiet {
            return false;
        }

        // A reporter that has gone away is not an error for the emitter
        self.tx
            .send(Announcement {
                from: from.to_string(),
                message: message.into(),
            })
            .is_ok()
    }

    /// Emits an important announcement.
    pub fn say(&self, from: &str, message: impl Into<String>) -> bool {
        self.announce(Priority::Important, from, message)
    }

    /// Emits a low-priority announcement.
    pub fn detail(&self, from: &str, message: impl Into<String>) -> bool {
        self.announce(Priority::Detail, from, message)
    }

    /// Returns the verbosity level.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Consumer half, drained by the reporter.
#[derive(Debug)]
pub struct AnnouncementStream {
    rx: mpsc::UnboundedReceiver<Announcement>,
}

impl AnnouncementStream {
    /// Delivers every record to `sink` until all announcers are dropped.
    ///
    /// Returns the sink so collected records can be inspected.
    pub async fn drain_into<S: AnnouncementSink>(mut self, mut sink: S) -> S {
        while let Some(announcement) = self.rx.recv().await {
            sink.deliver(announcement);
        }
        sink
    }

    /// Like [`drain_into`](Self::drain_into), but also returns once `stop`
    /// completes, after delivering every record already queued.
    ///
    /// Philosophers still seated at the run deadline keep their announcers,
    /// so the stream never ends on its own in that case.
    pub async fn drain_until<S, F>(mut self, mut sink: S, stop: F) -> S
    where
        S: AnnouncementSink,
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            tokio::select! {
                biased;
                announcement = self.rx.recv() => match announcement {
                    Some(announcement) => sink.deliver(announcement),
                    None => return sink,
                },
                _ = &mut stop => break,
            }
        }

        while let Ok(announcement) = self.rx.try_recv() {
            sink.deliver(announcement);
        }
        sink
    }
}

/// Creates the announcement channel.
pub fn channel(verbosity: Verbosity) -> (Announcer, AnnouncementStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Announcer { tx, verbosity }, AnnouncementStream { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_display_pads_source() {
        let a = Announcement {
            from: "Main".to_string(),
            message: "hello".to_string(),
        };
        assert_eq!(a.to_string(), format!("{:<25}: hello", "Main"));
    }

    #[tokio::test]
    async fn test_quiet_announcer_drops_details() {
        let (announcer, stream) = channel(Verbosity::Quiet);

        assert!(announcer.say("plato", "important"));
        assert!(!announcer.detail("plato", "chatter"));
        drop(announcer);

        let records = stream.drain_into(Vec::new()).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "important");
    }

    #[tokio::test]
    async fn test_per_source_order_preserved() {
        let (announcer, stream) = channel(Verbosity::Verbose);

        let producers: Vec<_> = ["kant", "hume"]
            .into_iter()
            .map(|name| {
                let announcer = announcer.clone();
                tokio::spawn(async move {
                    for i in 0..20 {
                        announcer.detail(name, i.to_string());
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        drop(announcer);

        let reporter = tokio::spawn(stream.drain_into(Vec::new()));
        for producer in producers {
            producer.await.unwrap();
        }
        let records = reporter.await.unwrap();

        assert_eq!(records.len(), 40);
        for name in ["kant", "hume"] {
            let seen: Vec<String> = records
                .iter()
                .filter(|a| a.from == name)
                .map(|a| a.message.clone())
                .collect();
            let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
            assert_eq!(seen, expected);
        }
    }

    #[tokio::test]
    async fn test_drain_until_flushes_queue_while_announcers_live() {
        let (announcer, stream) = channel(Verbosity::Quiet);
        for i in 0..3 {
            announcer.say("hume", i.to_string());
        }

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let reporter = tokio::spawn(stream.drain_until(Vec::new(), async {
            let _ = stop_rx.await;
        }));

        tokio::task::yield_now().await;
        announcer.say("Main", "last word");
        stop_tx.send(()).unwrap();

        let records = reporter.await.unwrap();
        let messages: Vec<&str> = records.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, ["0", "1", "2", "last word"]);

        // The announcer outlived the reporter
        assert!(!announcer.say("Main", "too late"));
    }

    #[tokio::test]
    async fn test_drain_until_ends_with_announcers() {
        let (announcer, stream) = channel(Verbosity::Quiet);
        announcer.say("Main", "only");
        drop(announcer);

        let records = stream.drain_until(Vec::new(), std::future::pending()).await;
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_send_after_reporter_gone_is_silent() {
        let (announcer, stream) = channel(Verbosity::Verbose);
        drop(stream);
        assert!(!announcer.say("Main", "nobody listens"));
    }
}

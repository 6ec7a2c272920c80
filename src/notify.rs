//! Notifications to the embedding host.
//!
//! Every event is a single opaque string. Events without a payload are sent
//! as the bare event name; events with a payload are a JSON envelope
//! `{"event": ..., "data": {...}}`. Delivery failures never reach game
//! state: they are logged and dropped.

use std::fmt;
use std::io::Write;
use std::sync::mpsc;

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::SinkError;

/// Event name sent when the host should close the game view.
pub const CLOSE_WEBVIEW: &str = "close_webview";
/// Event name for a player level-up.
pub const LEVEL_UP: &str = "level_up";
/// Event name for the end of a Snake run.
pub const SNAKE_GAME_OVER: &str = "snake_game_over";

/// A single event for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Bare event name, no payload.
    Event(String),
    /// Event with a JSON object payload.
    Payload {
        /// Event name.
        event: String,
        /// Event data.
        data: Value,
    },
}

#[derive(Serialize)]
struct Envelope<'a> {
    event: &'a str,
    data: &'a Value,
}

impl Notification {
    /// The host should close the game view.
    #[must_use]
    pub fn close_webview() -> Self {
        Self::Event(CLOSE_WEBVIEW.to_string())
    }

    /// The player reached `level`.
    #[must_use]
    pub fn level_up(level: u32) -> Self {
        Self::Payload {
            event: LEVEL_UP.to_string(),
            data: json!({ "level": level }),
        }
    }

    /// A Snake run ended with `score`.
    #[must_use]
    pub fn snake_game_over(score: u32) -> Self {
        Self::Payload {
            event: SNAKE_GAME_OVER.to_string(),
            data: json!({ "score": score }),
        }
    }

    /// Name of the event.
    #[must_use]
    pub fn event(&self) -> &str {
        match self {
            Self::Event(event) | Self::Payload { event, .. } => event,
        }
    }

    /// Encode into the wire string handed to the sink.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Event(event) => event.clone(),
            Self::Payload { event, data } => {
                // Serializing a str and a Value cannot fail.
                serde_json::to_string(&Envelope { event, data }).unwrap_or_else(|_| event.clone())
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Transport to the embedding host.
pub trait NotificationSink: Send {
    /// Deliver one encoded message.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached.
    fn deliver(&mut self, message: &str) -> Result<(), SinkError>;
}

impl NotificationSink for mpsc::Sender<String> {
    fn deliver(&mut self, message: &str) -> Result<(), SinkError> {
        self.send(message.to_string())
            .map_err(|_| SinkError::Disconnected)
    }
}

/// Sink that writes one message per line.
#[derive(Debug)]
pub struct LineSink<W> {
    writer: W,
}

impl<W: Write + Send> LineSink<W> {
    /// Wrap a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> NotificationSink for LineSink<W> {
    fn deliver(&mut self, message: &str) -> Result<(), SinkError> {
        writeln!(self.writer, "{message}")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Fans a message out to several sinks.
///
/// Every sink is attempted; the first failure is reported.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl FanoutSink {
    /// Create an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    #[must_use]
    pub fn with(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl NotificationSink for FanoutSink {
    fn deliver(&mut self, message: &str) -> Result<(), SinkError> {
        let mut first_err = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.deliver(message) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Engine-side handle to the host sink.
///
/// Holds an optional sink; with no sink attached, events are only logged.
#[derive(Default)]
pub struct Notifier {
    sink: Option<Box<dyn NotificationSink>>,
    sent: u64,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("attached", &self.sink.is_some())
            .field("sent", &self.sent)
            .finish()
    }
}

impl Notifier {
    /// A notifier with no sink attached.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// A notifier delivering to `sink`.
    #[must_use]
    pub fn new(sink: impl NotificationSink + 'static) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            sent: 0,
        }
    }

    /// Number of notifications handed to the sink successfully.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    /// Deliver a notification, logging instead of failing.
    pub fn emit(&mut self, notification: &Notification) {
        let event = notification.event();
        let message = notification.encode();
        let Some(sink) = self.sink.as_mut() else {
            tracing::info!(event, %message, "host unavailable, notification logged only");
            return;
        };
        match sink.deliver(&message) {
            Ok(()) => {
                self.sent += 1;
                tracing::debug!(event, "notification delivered");
            }
            Err(e) => tracing::warn!(event, %message, error = %e, "notification delivery failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Notification::close_webview().event(), "close_webview");
        assert_eq!(Notification::level_up(3).event(), "level_up");
        assert_eq!(Notification::snake_game_over(40).event(), "snake_game_over");
    }

    #[test]
    fn test_bare_event_encoding() {
        assert_eq!(Notification::close_webview().encode(), "close_webview");
    }

    #[test]
    fn test_envelope_encoding() {
        let encoded = Notification::snake_game_over(40).encode();
        let parsed: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(parsed["event"], "snake_game_over");
        assert_eq!(parsed["data"]["score"], 40);
    }

    #[test]
    fn test_level_up_encoding() {
        let encoded = Notification::level_up(3).encode();
        assert_eq!(encoded, r#"{"event":"level_up","data":{"level":3}}"#);
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = mpsc::channel();
        let mut notifier = Notifier::new(tx);
        notifier.emit(&Notification::close_webview());
        assert_eq!(rx.try_recv().unwrap(), "close_webview");
        assert_eq!(notifier.sent(), 1);
    }

    #[test]
    fn test_disconnected_sink_is_not_fatal() {
        let (tx, rx) = mpsc::channel::<String>();
        drop(rx);
        let mut notifier = Notifier::new(tx);
        notifier.emit(&Notification::level_up(2));
        assert_eq!(notifier.sent(), 0);
    }

    #[test]
    fn test_detached_notifier_only_logs() {
        let mut notifier = Notifier::detached();
        notifier.emit(&Notification::close_webview());
        assert_eq!(notifier.sent(), 0);
    }

    #[test]
    fn test_line_sink_writes_lines() {
        let mut sink = LineSink::new(Vec::new());
        sink.deliver("a").unwrap();
        sink.deliver("b").unwrap();
        assert_eq!(String::from_utf8(sink.writer).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let (tx1, rx1) = mpsc::channel();
        let (tx2, rx2) = mpsc::channel();
        let mut fanout = FanoutSink::new().with(tx1).with(tx2);
        fanout.deliver("ping").unwrap();
        assert_eq!(rx1.try_recv().unwrap(), "ping");
        assert_eq!(rx2.try_recv().unwrap(), "ping");
    }
}

use std::{
    fmt::Display,
    path::PathBuf,
    pin::Pin,
    task::{Context, Poll},
};

use futures::Stream;
use futures_channel::mpsc;

use crate::errors::DiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Something worth telling the host about
#[derive(Debug, Clone)]
pub struct Event {
    pub severity: Severity,
    pub message: String,
    /// File the event originates from, if any
    pub origin: Option<PathBuf>,
    pub error: Option<DiError>,
}

impl Event {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(error: DiError) -> Self {
        Event {
            message: error.to_string(),
            error: Some(error),
            ..Self::new(Severity::Error, "")
        }
    }

    pub(crate) fn new(severity: Severity, message: impl Into<String>) -> Self {
        Event {
            severity,
            message: message.into(),
            origin: None,
            error: None,
        }
    }

    pub fn with_origin(mut self, origin: Option<PathBuf>) -> Self {
        self.origin = origin;
        self
    }
}
impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{} ({})", self.message, origin.display()),
            None => f.write_str(&self.message),
        }
    }
}

/// Receives events raised while registering and resolving
///
/// Sinks must not block, resolution never waits on them.
pub trait NotificationSink {
    fn notify(&self, event: &Event);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;
impl NotificationSink for TracingSink {
    fn notify(&self, event: &Event) {
        let origin = event.origin.as_ref().map(|origin| origin.display());
        match (event.severity, origin) {
            (Severity::Info, Some(origin)) => tracing::info!(%origin, "{}", event.message),
            (Severity::Info, None) => tracing::info!("{}", event.message),
            (Severity::Warn, Some(origin)) => tracing::warn!(%origin, "{}", event.message),
            (Severity::Warn, None) => tracing::warn!("{}", event.message),
            (Severity::Error, Some(origin)) => tracing::error!(%origin, "{}", event.message),
            (Severity::Error, None) => tracing::error!("{}", event.message),
        }
    }
}

/// Sends events to an [`EventStream`] listeners can await on
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}
impl ChannelSink {
    pub fn channel() -> (ChannelSink, EventStream) {
        let (tx, rx) = mpsc::unbounded();
        (ChannelSink { tx }, EventStream { rx })
    }
}
impl NotificationSink for ChannelSink {
    fn notify(&self, event: &Event) {
        // A closed channel only means nobody listens anymore
        let _ = self.tx.unbounded_send(event.clone());
    }
}

/// Receiving end of a [`ChannelSink`]
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<Event>,
}
impl EventStream {
    /// Takes all events sent so far without waiting
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn channel_sink_delivers_in_order() {
        let (sink, stream) = ChannelSink::channel();

        sink.notify(&Event::info("first"));
        sink.notify(&Event::error(DiError::NotFound("db".into())));
        drop(sink);

        let events: Vec<Event> = futures::executor::block_on(stream.collect());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].severity, Severity::Info);
        assert!(matches!(events[1].error, Some(DiError::NotFound(ref name)) if name == "db"));
    }

    #[test]
    fn notifying_without_listener_is_fine() {
        let (sink, stream) = ChannelSink::channel();
        drop(stream);

        sink.notify(&Event::warn("nobody listens"));
    }

    #[test]
    fn display_includes_origin() {
        let event = Event::warn("skipped").with_origin(Some(PathBuf::from("units/a.rs")));

        assert_eq!(event.to_string(), "skipped (units/a.rs)");
    }
}

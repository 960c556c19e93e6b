//! Simulation lifecycle events and their dispatcher.

use std::fmt;
use std::str::FromStr;

use crate::error::LayoutError;

/// Kinds of events a force simulation emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The simulation went from cooled to running.
    Start,
    /// One integration step completed.
    Tick,
    /// The simulation cooled down or was stopped.
    End,
}

impl EventKind {
    /// The event name as used by hosts ("start", "tick", "end").
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Tick => "tick",
            EventKind::End => "end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = LayoutError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "start" => Ok(EventKind::Start),
            "tick" => Ok(EventKind::Tick),
            "end" => Ok(EventKind::End),
            other => Err(LayoutError::UnknownEvent(other.to_string())),
        }
    }
}

/// Event payload passed to handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceEvent {
    pub kind: EventKind,
    /// Simulation temperature when the event fired.
    pub alpha: f32,
}

impl ForceEvent {
    pub fn new(kind: EventKind, alpha: f32) -> Self {
        Self { kind, alpha }
    }
}

/// Boxed event callback.
pub type EventHandler = Box<dyn FnMut(&ForceEvent)>;

/// One handler slot per event kind; registering again replaces the slot.
#[derive(Default)]
pub struct Dispatcher {
    start: Option<EventHandler>,
    tick: Option<EventHandler>,
    end: Option<EventHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or clear the handler for `kind`.
    pub fn on(&mut self, kind: EventKind, handler: Option<EventHandler>) {
        *self.slot(kind) = handler;
    }

    /// Call the handler for `event.kind`, if any.
    pub fn emit(&mut self, event: &ForceEvent) {
        if let Some(handler) = self.slot(event.kind).as_mut() {
            handler(event);
        }
    }

    fn slot(&mut self, kind: EventKind) -> &mut Option<EventHandler> {
        match kind {
            EventKind::Start => &mut self.start,
            EventKind::Tick => &mut self.tick,
            EventKind::End => &mut self.end,
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("start", &self.start.is_some())
            .field("tick", &self.tick.is_some())
            .field("end", &self.end.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_event_names() {
        for kind in [EventKind::Start, EventKind::Tick, EventKind::End] {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert_eq!(
            "drag".parse::<EventKind>(),
            Err(LayoutError::UnknownEvent("drag".to_string()))
        );
    }

    #[test]
    fn test_emit_reaches_matching_slot_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();

        let log = Rc::clone(&seen);
        dispatcher.on(
            EventKind::End,
            Some(Box::new(move |event| log.borrow_mut().push(event.kind))),
        );

        dispatcher.emit(&ForceEvent::new(EventKind::Tick, 0.1));
        dispatcher.emit(&ForceEvent::new(EventKind::End, 0.0));

        assert_eq!(*seen.borrow(), vec![EventKind::End]);
    }

    #[test]
    fn test_on_replaces_and_clears() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();

        for tag in ["first", "second"] {
            let log = Rc::clone(&seen);
            dispatcher.on(
                EventKind::Tick,
                Some(Box::new(move |_| log.borrow_mut().push(tag))),
            );
        }
        dispatcher.emit(&ForceEvent::new(EventKind::Tick, 0.1));

        dispatcher.on(EventKind::Tick, None);
        dispatcher.emit(&ForceEvent::new(EventKind::Tick, 0.1));

        assert_eq!(*seen.borrow(), vec!["second"]);
    }
}

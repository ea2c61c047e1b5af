use ahash::AHashMap;

/// Kinds of in-flight API calls an editor session tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Load,
    Save,
    ToggleActive,
    TestRun,
}

/// Handed out when a request starts and presented again when its response
/// arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub kind: RequestKind,
    generation: u64,
}

/// Decides whether a response may still be applied.
///
/// Only the newest request of each kind is live. Starting another request of
/// the same kind supersedes the previous one, a response is accepted at most
/// once, and closing the tracker rejects everything still outstanding.
#[derive(Debug, Default)]
pub struct RequestTracker {
    live: AHashMap<RequestKind, u64>,
    next_generation: u64,
    closed: bool,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, kind: RequestKind) -> RequestTicket {
        self.next_generation += 1;
        self.live.insert(kind, self.next_generation);
        RequestTicket {
            kind,
            generation: self.next_generation,
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        !self.closed && self.live.get(&ticket.kind) == Some(&ticket.generation)
    }

    /// Consumes the ticket if it is current. Returns `false` for stale,
    /// duplicate, or post-close responses, which must be ignored.
    pub fn accept(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                kind = ?ticket.kind,
                generation = ticket.generation,
                "ignoring stale response"
            );
            return false;
        }
        self.live.remove(&ticket.kind);
        true
    }

    pub fn pending(&self, kind: RequestKind) -> bool {
        !self.closed && self.live.contains_key(&kind)
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.live.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

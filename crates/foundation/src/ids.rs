/// Sequence number handed out when an asynchronous request starts.
///
/// Tickets from one [`SequenceFence`] are strictly increasing; only the most
/// recently issued ticket is allowed to land its result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

/// Last-issued-wins fencing for one request channel (uploads, submissions).
#[derive(Debug, Default, Clone)]
pub struct SequenceFence {
    issued: u64,
    settled: Option<u64>,
}

impl SequenceFence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn latest(&self) -> Option<Ticket> {
        (self.issued > 0).then_some(Ticket(self.issued))
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued && self.settled != Some(ticket.0)
    }

    /// Marks `ticket` as resolved.
    ///
    /// Returns `false` (and changes nothing) when a newer ticket has been
    /// issued since or the ticket already settled.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.settled = Some(ticket.0);
        true
    }

    /// Invalidates any outstanding ticket without starting a new request.
    pub fn cancel(&mut self) {
        self.issued += 1;
        self.settled = Some(self.issued);
    }

    /// A request is outstanding when the latest ticket has not settled yet.
    pub fn is_pending(&self) -> bool {
        self.issued > 0 && self.settled != Some(self.issued)
    }
}

#[cfg(test)]
mod tests {
    use super::{SequenceFence, Ticket};

    #[test]
    fn tickets_increase() {
        let mut f = SequenceFence::new();
        assert_eq!(f.latest(), None);
        let a = f.issue();
        let b = f.issue();
        assert!(b > a);
        assert_eq!(f.latest(), Some(b));
    }

    #[test]
    fn stale_ticket_cannot_settle() {
        let mut f = SequenceFence::new();
        let first = f.issue();
        let second = f.issue();
        assert!(!f.settle(first));
        assert!(f.is_pending());
        assert!(f.settle(second));
        assert!(!f.is_pending());
        assert!(!f.settle(second));
    }

    #[test]
    fn cancel_retires_outstanding_ticket() {
        let mut f = SequenceFence::new();
        let t = f.issue();
        f.cancel();
        assert!(!f.is_pending());
        assert!(!f.settle(t));
        assert!(f.issue() > t);
    }

    #[test]
    fn unknown_ticket_is_not_current() {
        let f = SequenceFence::new();
        assert!(!f.is_current(Ticket(1)));
    }
}

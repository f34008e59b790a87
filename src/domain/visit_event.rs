//! Visit event model for asynchronous visit counting.

/// A visit to a short link, queued by the redirect handler.
///
/// The redirect response is sent before the event is processed, so counting
/// never delays the client.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler once the link is resolved
/// 2. Sent to the bounded channel (non-blocking; dropped if full)
/// 3. Processed by [`crate::domain::visit_worker::run_visit_worker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitEvent {
    pub link_id: i64,
    /// Kept for log context only.
    pub code: String,
}

impl VisitEvent {
    pub fn new(link_id: i64, code: impl Into<String>) -> Self {
        Self {
            link_id,
            code: code.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_event_creation() {
        let event = VisitEvent::new(42, "AbC12");

        assert_eq!(event.link_id, 42);
        assert_eq!(event.code, "AbC12");
    }
}

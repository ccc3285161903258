/// A value as last confirmed by the server, with an optional local overlay
/// for a write that has not been acknowledged yet.
///
/// `propose` sets the overlay, `reconcile` replaces everything with the
/// server's answer, `rollback` drops the overlay. Readers see the overlay
/// while it exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tentative<T> {
    confirmed: T,
    overlay: Option<T>,
}

impl<T> Tentative<T> {
    pub fn new(confirmed: T) -> Self {
        Self {
            confirmed,
            overlay: None,
        }
    }

    pub fn current(&self) -> &T {
        self.overlay.as_ref().unwrap_or(&self.confirmed)
    }

    pub fn confirmed(&self) -> &T {
        &self.confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn propose(&mut self, value: T) {
        self.overlay = Some(value);
    }

    pub fn reconcile(&mut self, server_value: T) {
        self.confirmed = server_value;
        self.overlay = None;
    }

    pub fn rollback(&mut self) {
        self.overlay = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_shadows_confirmed_until_resolved() {
        let mut count = Tentative::new(3u32);
        assert_eq!(*count.current(), 3);
        assert!(!count.is_pending());

        count.propose(4);
        assert_eq!(*count.current(), 4);
        assert_eq!(*count.confirmed(), 3);
        assert!(count.is_pending());
    }

    #[test]
    fn reconcile_takes_the_server_value_over_the_guess() {
        let mut count = Tentative::new(3u32);
        count.propose(4);
        count.reconcile(6);
        assert_eq!(*count.current(), 6);
        assert_eq!(*count.confirmed(), 6);
        assert!(!count.is_pending());
    }

    #[test]
    fn rollback_restores_last_confirmed() {
        let mut count = Tentative::new(3u32);
        count.propose(4);
        count.rollback();
        assert_eq!(count, Tentative::new(3));
    }
}

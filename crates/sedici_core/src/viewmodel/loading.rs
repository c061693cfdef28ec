//! Shared in-flight operation counter.

use std::sync::Arc;
use tokio::sync::watch;

/// Counts launched operations that have not resolved yet.
///
/// Consumers only see the derived boolean through [`is_loading`]. Clones
/// share the same counter.
///
/// [`is_loading`]: LoadingCounter::is_loading
#[derive(Clone)]
pub struct LoadingCounter {
    count: Arc<watch::Sender<usize>>,
}

impl LoadingCounter {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            count: Arc::new(count),
        }
    }

    pub fn add_loader(&self) {
        self.count.send_modify(|count| *count += 1);
    }

    /// Saturates at zero so an unmatched release cannot underflow.
    pub fn remove_loader(&self) {
        self.count
            .send_modify(|count| *count = count.saturating_sub(1));
    }

    pub fn is_loading(&self) -> bool {
        *self.count.borrow() > 0
    }

    /// Change notifications for composing UI-state.
    pub(crate) fn observe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}

impl Default for LoadingCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::LoadingCounter;

    #[test]
    fn overlapping_loaders_keep_flag_until_all_resolve() {
        let loading = LoadingCounter::new();
        assert!(!loading.is_loading());

        loading.add_loader();
        loading.add_loader();
        loading.remove_loader();
        assert!(loading.is_loading());

        loading.remove_loader();
        assert!(!loading.is_loading());
    }

    #[test]
    fn remove_without_add_does_not_underflow() {
        let loading = LoadingCounter::new();
        loading.remove_loader();
        loading.add_loader();
        assert!(loading.is_loading());
    }

    #[test]
    fn clones_share_the_counter() {
        let loading = LoadingCounter::new();
        let shared = loading.clone();
        shared.add_loader();
        assert!(loading.is_loading());
    }
}

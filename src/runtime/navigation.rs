use tracing::debug;

/// Current page plus the back stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    current: Option<i64>,
    history: Vec<i64>,
}

impl Navigation {
    pub fn current(&self) -> Option<i64> {
        self.current
    }

    pub fn history(&self) -> &[i64] {
        &self.history
    }

    pub fn reset(&mut self, current: Option<i64>) {
        self.current = current;
        self.history.clear();
    }

    /// Pushes the current page unless it already tops the history, then
    /// moves to `page`.
    pub fn go_to(&mut self, page: i64) {
        if let Some(current) = self.current {
            if self.history.last() != Some(&current) {
                self.history.push(current);
            }
        }
        debug!(from = ?self.current, to = page, "navigate");
        self.current = Some(page);
    }

    /// Returns the page left, or `None` when there is no history.
    pub fn back(&mut self) -> Option<Option<i64>> {
        let previous = self.history.pop()?;
        let left = self.current.replace(previous);
        debug!(from = ?left, to = previous, "navigate back");
        Some(left)
    }
}

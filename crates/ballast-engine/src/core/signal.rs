/// Tri-state run signal polled by the run-loop driver after every callback.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RunSignal {
    #[default]
    Continue,
    Success,
    Failure,
}

impl RunSignal {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunSignal::Continue)
    }

    /// Moves to `next` unless already terminal. Returns the resulting value.
    ///
    /// Terminal states are absorbing; moving back to `Continue` is ignored too.
    pub fn transition(&mut self, next: RunSignal) -> RunSignal {
        if !self.is_terminal() {
            *self = next;
        }
        *self
    }
}

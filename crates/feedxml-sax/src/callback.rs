//! Callback trait for consuming scanner events.

use crate::SaxEvent;

/// Receives events pushed by [`Scanner::parse`](crate::Scanner::parse).
pub trait SaxHandler<'src> {
    /// Handle one event. Return `false` to stop scanning early.
    fn event(&mut self, event: SaxEvent<'src>) -> bool;
}

impl<'src> SaxHandler<'src> for Vec<SaxEvent<'src>> {
    fn event(&mut self, event: SaxEvent<'src>) -> bool {
        self.push(event);
        true
    }
}

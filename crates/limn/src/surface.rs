//! Drawing surfaces, the consumers of [`DrawCommand`]s.
//!
//! - [`RecordingSurface`] keeps the commands in memory.
//! - [`HostSurface`] forwards them to an [`AutomationHost`](crate::automation::AutomationHost).

mod host;

use log::trace;

use limn_core::command::DrawCommand;

use crate::{cancel::CancellationToken, error::LimnError};

pub use host::HostSurface;

/// Receives drawing commands in emission order.
pub trait DrawingSurface {
    /// Applies one command.
    ///
    /// # Errors
    ///
    /// Surface-specific; an error aborts rendering.
    fn apply(&mut self, command: DrawCommand, cancel: &CancellationToken) -> Result<(), LimnError>;

    /// Completes a batch of commands. Called once at the end of rendering.
    ///
    /// # Errors
    ///
    /// Surface-specific.
    fn flush(&mut self, cancel: &CancellationToken) -> Result<(), LimnError>;
}

impl<D: DrawingSurface + ?Sized> DrawingSurface for &mut D {
    fn apply(&mut self, command: DrawCommand, cancel: &CancellationToken) -> Result<(), LimnError> {
        (**self).apply(command, cancel)
    }

    fn flush(&mut self, cancel: &CancellationToken) -> Result<(), LimnError> {
        (**self).flush(cancel)
    }
}

/// Surface that records every command it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    flushes: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received so far, in order.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of times [`flush`](DrawingSurface::flush) was called.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl DrawingSurface for RecordingSurface {
    fn apply(&mut self, command: DrawCommand, _cancel: &CancellationToken) -> Result<(), LimnError> {
        trace!(command:% = command; "Recording command");
        self.commands.push(command);
        Ok(())
    }

    fn flush(&mut self, _cancel: &CancellationToken) -> Result<(), LimnError> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use limn_core::command::SetText;

    use super::*;

    #[test]
    fn test_recording_keeps_order_and_counts_flushes() {
        let mut surface = RecordingSurface::new();
        let cancel = CancellationToken::new();

        surface.apply(SetText::new("a", "1").into(), &cancel).unwrap();
        surface.apply(SetText::new("b", "2").into(), &cancel).unwrap();
        surface.flush(&cancel).unwrap();

        let targets: Vec<_> = surface.commands().iter().map(DrawCommand::target_id).collect();
        assert_eq!(targets, vec!["a", "b"]);
        assert_eq!(surface.flush_count(), 1);
        assert_eq!(surface.into_commands().len(), 2);
    }
}

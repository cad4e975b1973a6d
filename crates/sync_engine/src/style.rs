//! Map style selection.

use contracts::RenderCommand;

/// Tracks the applied style index and emits a style change when it differs
#[derive(Debug, Clone)]
pub struct StyleSelector {
    default_index: usize,
    previous: Option<usize>,
}

impl StyleSelector {
    pub fn new(default_index: usize) -> Self {
        Self {
            default_index,
            previous: Some(default_index),
        }
    }

    /// The surface was recreated with the default style
    pub fn reset(&mut self) {
        self.previous = Some(self.default_index);
    }

    pub fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Select `index`; returns a `SetStyle` command when it changed
    ///
    /// An index outside `urls` is remembered but produces no command.
    pub fn select(&mut self, index: usize, urls: &[String]) -> Option<RenderCommand> {
        if self.previous == Some(index) {
            return None;
        }
        self.previous = Some(index);

        match urls.get(index) {
            Some(url) => Some(RenderCommand::SetStyle { url: url.clone() }),
            None => {
                tracing::warn!(index, table_len = urls.len(), "Map style index out of range");
                None
            }
        }
    }
}

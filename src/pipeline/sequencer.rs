use std::collections::BTreeMap;

/// Turns out-of-order worker completions into dense, input-ordered output indices.
///
/// Every input position must be reported exactly once, either with a value (the image produced
/// a frame) or `None` (it failed or was skipped). Indices start at 1 and are only handed to
/// values, so failures leave no gaps.
#[derive(Debug)]
pub struct FrameSequencer<T> {
    next_position: usize,
    next_index: u64,
    pending: BTreeMap<usize, Option<T>>,
}

/// A value released by the sequencer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequenced<T> {
    /// 1-based output index.
    pub index: u64,
    /// Position of the image in input sort order.
    pub position: usize,
    pub value: T,
}

impl<T> Default for FrameSequencer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameSequencer<T> {
    pub fn new() -> Self {
        Self {
            next_position: 0,
            next_index: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Record the completion of `position` and return everything that is now releasable, in
    /// input order. Duplicate or already-released positions are ignored.
    pub fn complete(&mut self, position: usize, value: Option<T>) -> Vec<Sequenced<T>> {
        if position < self.next_position || self.pending.contains_key(&position) {
            tracing::warn!(position, "duplicate completion ignored");
            return Vec::new();
        }
        self.pending.insert(position, value);

        let mut ready = Vec::new();
        while let Some(value) = self.pending.remove(&self.next_position) {
            if let Some(value) = value {
                ready.push(Sequenced {
                    index: self.next_index,
                    position: self.next_position,
                    value,
                });
                self.next_index += 1;
            }
            self.next_position += 1;
        }
        ready
    }

    /// Number of input positions fully drained so far.
    pub fn drained(&self) -> usize {
        self.next_position
    }

    /// Completed positions still waiting on an earlier one.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Number of indices handed out.
    pub fn assigned(&self) -> u64 {
        self.next_index - 1
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/sequencer.rs"]
mod tests;

/// Linear undo/redo over immutable snapshots.
///
/// The stack is never empty and `cursor` always indexes a live entry.
/// Pushing after an undo drops everything beyond the cursor; there is no
/// branching history.
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    stack: Vec<T>,
    cursor: usize,
}

impl<T> HistoryStack<T> {
    pub fn new(initial: T) -> Self {
        Self {
            stack: vec![initial],
            cursor: 0,
        }
    }

    /// Rebuilds a stack from persisted parts. Returns `None` when the parts
    /// cannot describe a valid stack.
    pub fn from_parts(stack: Vec<T>, cursor: usize) -> Option<Self> {
        if stack.is_empty() || cursor >= stack.len() {
            return None;
        }
        Some(Self { stack, cursor })
    }

    pub fn current(&self) -> &T {
        &self.stack[self.cursor]
    }

    pub fn push(&mut self, next: T) {
        self.stack.truncate(self.cursor + 1);
        self.stack.push(next);
        self.cursor = self.stack.len() - 1;
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.stack.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn snapshots(&self) -> &[T] {
        &self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_and_redo_stop_at_the_ends() {
        let mut h = HistoryStack::new(0);
        assert!(!h.undo());
        assert!(!h.redo());
        h.push(1);
        h.push(2);
        assert!(h.undo());
        assert!(h.undo());
        assert!(!h.undo());
        assert_eq!(*h.current(), 0);
        assert!(h.redo());
        assert!(h.redo());
        assert!(!h.redo());
        assert_eq!(*h.current(), 2);
    }

    #[test]
    fn push_after_undo_discards_redo_branch() {
        let mut h = HistoryStack::new("a");
        h.push("b");
        h.push("c");
        h.undo();
        h.undo();
        h.push("d");
        assert_eq!(h.snapshots(), &["a", "d"]);
        assert!(!h.can_redo());
        assert!(!h.redo());
        assert_eq!(*h.current(), "d");
    }

    #[test]
    fn from_parts_rejects_bad_shapes() {
        assert!(HistoryStack::<i32>::from_parts(vec![], 0).is_none());
        assert!(HistoryStack::from_parts(vec![1, 2], 2).is_none());
        let h = HistoryStack::from_parts(vec![1, 2, 3], 1).expect("valid parts");
        assert_eq!(*h.current(), 2);
        assert!(h.can_undo());
        assert!(h.can_redo());
    }
}

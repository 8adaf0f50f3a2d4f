#[path = "../src/history.rs"]
mod history;

use history::HistoryStack;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Push(u32),
    Undo,
    Redo,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u32>().prop_map(Op::Push),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

fn apply(stack: &mut HistoryStack<u32>, op: &Op) -> bool {
    match op {
        Op::Push(v) => {
            stack.push(*v);
            true
        }
        Op::Undo => stack.undo(),
        Op::Redo => stack.redo(),
    }
}

proptest! {
    #[test]
    fn cursor_stays_in_bounds(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut stack = HistoryStack::new(0u32);
        for op in &ops {
            apply(&mut stack, op);
            prop_assert!(stack.len() >= 1);
            prop_assert!(stack.cursor() < stack.len());
            prop_assert_eq!(stack.current(), &stack.snapshots()[stack.cursor()]);
        }
    }

    #[test]
    fn undo_after_push_restores_previous_and_redo_reapplies(
        ops in prop::collection::vec(op_strategy(), 0..32),
        next in any::<u32>(),
    ) {
        let mut stack = HistoryStack::new(0u32);
        for op in &ops {
            apply(&mut stack, op);
        }
        let before = *stack.current();
        stack.push(next);
        prop_assert!(stack.undo());
        prop_assert_eq!(*stack.current(), before);
        prop_assert!(stack.redo());
        prop_assert_eq!(*stack.current(), next);
    }

    #[test]
    fn push_after_undo_discards_forward_history(
        pushes in prop::collection::vec(any::<u32>(), 1..16),
        undos in 1usize..16,
        next in any::<u32>(),
    ) {
        let mut stack = HistoryStack::new(0u32);
        for v in &pushes {
            stack.push(*v);
        }
        for _ in 0..undos {
            stack.undo();
        }
        let cursor = stack.cursor();
        stack.push(next);
        prop_assert_eq!(stack.len(), cursor + 2);
        prop_assert!(!stack.can_redo());
        prop_assert!(!stack.redo());
        prop_assert_eq!(*stack.current(), next);
    }

    #[test]
    fn boundary_moves_are_no_ops(pushes in prop::collection::vec(any::<u32>(), 0..8)) {
        let mut stack = HistoryStack::new(0u32);
        for v in &pushes {
            stack.push(*v);
        }
        prop_assert!(!stack.redo());
        while stack.undo() {}
        prop_assert_eq!(stack.cursor(), 0);
        prop_assert_eq!(*stack.current(), 0);
        prop_assert!(!stack.undo());
        prop_assert_eq!(stack.len(), pushes.len() + 1);
    }
}

#[test]
fn from_parts_rejects_impossible_states() {
    assert!(HistoryStack::<u32>::from_parts(vec![], 0).is_none());
    assert!(HistoryStack::from_parts(vec![1u32, 2], 2).is_none());
    let stack = HistoryStack::from_parts(vec![1u32, 2, 3], 1).expect("valid parts");
    assert_eq!(*stack.current(), 2);
    assert!(stack.can_undo());
    assert!(stack.can_redo());
}

//! Helpers for the boxed value stack.
//!
//! The stack is a plain `Vec<IValue>` whose top is the end of the vector.
//! Popping past the bottom is a caller bug and panics.

use crate::IValue;

pub type Stack = Vec<IValue>;

pub fn pop(stack: &mut Stack) -> IValue {
    match stack.pop() {
        Some(v) => v,
        None => panic!("pop from an empty stack"),
    }
}

/// Pop the top `n` values, keeping them in stack order.
pub fn pop_n(stack: &mut Stack, n: usize) -> Vec<IValue> {
    assert!(
        n <= stack.len(),
        "cannot pop {n} values from a stack of depth {}",
        stack.len()
    );
    let at = stack.len() - n;
    stack.split_off(at)
}

/// Borrow the top `n` values in stack order.
pub fn peek_n(stack: &Stack, n: usize) -> &[IValue] {
    assert!(
        n <= stack.len(),
        "cannot peek {n} values on a stack of depth {}",
        stack.len()
    );
    &stack[stack.len() - n..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_n_preserves_order() {
        let mut stack: Stack = vec![1i64.into(), 2i64.into(), 3i64.into()];
        let top = pop_n(&mut stack, 2);
        assert_eq!(stack.len(), 1);
        assert_eq!(top[0].to_i64(), Some(2));
        assert_eq!(top[1].to_i64(), Some(3));
    }

    #[test]
    fn pop_zero_is_empty() {
        let mut stack: Stack = vec![IValue::None];
        assert!(pop_n(&mut stack, 0).is_empty());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn peek_then_pop() {
        let mut stack: Stack = vec![7i64.into(), true.into()];
        assert_eq!(peek_n(&stack, 1)[0].to_bool(), Some(true));
        assert_eq!(peek_n(&stack, 2).len(), 2);
        assert!(pop(&mut stack).to_bool().unwrap());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    #[should_panic(expected = "empty stack")]
    fn pop_underflow_panics() {
        let mut stack = Stack::new();
        pop(&mut stack);
    }

    #[test]
    #[should_panic(expected = "cannot pop 2 values")]
    fn pop_n_underflow_panics() {
        let mut stack: Stack = vec![IValue::None];
        pop_n(&mut stack, 2);
    }
}

//! Property-based tests for context chaining.
//!
//! These exercise the guarantees the runner relies on when threading a context through hooks: extensions never
//! leak back into the context they were derived from, and the nearest binding wins.

use proptest::prelude::*;
use suitekit::{Context, Key};

const SLOTS: [Key<u32>; 4] = [Key::new("a"), Key::new("b"), Key::new("c"), Key::new("d")];

fn bindings() -> impl Strategy<Value = Vec<(usize, u32)>> {
    prop::collection::vec((0..SLOTS.len(), any::<u32>()), 0..16)
}

/// Apply `bindings` in order, returning every intermediate context.
fn chain(bindings: &[(usize, u32)]) -> Vec<Context> {
    let mut contexts = vec![Context::background()];
    for &(slot, value) in bindings {
        let next = contexts[contexts.len() - 1].with_value(&SLOTS[slot], value);
        contexts.push(next);
    }
    contexts
}

proptest! {
    /// Property: a lookup returns the last value bound for that key, or nothing.
    #[test]
    fn nearest_binding_wins(bindings in bindings()) {
        let contexts = chain(&bindings);
        let last = &contexts[contexts.len() - 1];

        for (slot, key) in SLOTS.iter().enumerate() {
            let expected = bindings.iter().rev().find(|(s, _)| *s == slot).map(|(_, v)| v);
            prop_assert_eq!(last.value(key), expected);
        }
    }

    /// Property: extending a context leaves every earlier context unchanged.
    #[test]
    fn extensions_do_not_leak_backwards(bindings in bindings()) {
        let contexts = chain(&bindings);

        for (depth, ctx) in contexts.iter().enumerate() {
            prop_assert_eq!(ctx.keys().len(), depth);
            for (slot, key) in SLOTS.iter().enumerate() {
                let expected = bindings[..depth].iter().rev().find(|(s, _)| *s == slot).map(|(_, v)| v);
                prop_assert_eq!(ctx.value(key), expected);
            }
        }
    }

    /// Property: sibling extensions of one base never see each other.
    #[test]
    fn siblings_are_isolated(left in any::<u32>(), right in any::<u32>()) {
        let base = Context::background().with_value(&SLOTS[0], 0);
        let a = base.with_value(&SLOTS[1], left);
        let b = base.with_value(&SLOTS[2], right);

        prop_assert_eq!(a.value(&SLOTS[2]), None);
        prop_assert_eq!(b.value(&SLOTS[1]), None);
        prop_assert_eq!(a.value(&SLOTS[0]), Some(&0));
        prop_assert_eq!(b.value(&SLOTS[0]), Some(&0));
    }

    /// Property: cancelling a context never affects the context it was derived from.
    #[test]
    fn cancellation_flows_downward_only(depth in 1usize..6, cancel_at in 0usize..6) {
        let cancel_at = cancel_at % depth;
        let mut contexts = vec![];
        let mut handles = vec![];
        let mut current = Context::background();
        for _ in 0..depth {
            let (ctx, handle) = current.with_cancel();
            contexts.push(ctx.clone());
            handles.push(handle);
            current = ctx;
        }

        handles[cancel_at].cancel();
        for (i, ctx) in contexts.iter().enumerate() {
            prop_assert_eq!(ctx.is_cancelled(), i >= cancel_at);
        }
    }
}

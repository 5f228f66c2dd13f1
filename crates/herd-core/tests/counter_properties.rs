//! Property-based tests for counter operations using proptest.
//!
//! The counter ops are the only shared-state mutations outside the locks;
//! these properties pin down their single-writer arithmetic so the
//! concurrency tests only need to reason about interleaving.
//!
//! Reproducible: set PROPTEST_SEED for deterministic runs.

use herd_core::SharedState;
use proptest::prelude::*;

/// A single-writer counter operation.
#[derive(Debug, Clone, Copy)]
enum Op {
    Set(i64),
    Add(i64),
    Double,
    Halve,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-1_000_000i64..1_000_000).prop_map(Op::Set),
        (-1000i64..1000).prop_map(Op::Add),
        Just(Op::Double),
        Just(Op::Halve),
    ]
}

proptest! {
    #[test]
    fn sequential_ops_match_the_integer_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let state = SharedState::new();
        let mut model: i64 = 0;
        for op in ops {
            match op {
                Op::Set(v) => { state.set_counter(v); model = v; }
                Op::Add(d) => { state.add(d); model = model.wrapping_add(d); }
                Op::Double => { state.double(); model = model.wrapping_mul(2); }
                Op::Halve => { state.halve(); model /= 2; }
            }
            prop_assert_eq!(state.counter(), model);
        }
    }

    #[test]
    fn double_then_halve_is_identity_without_other_writers(value in -1_000_000i64..1_000_000) {
        let state = SharedState::new();
        state.set_counter(value);
        state.double();
        state.halve();
        prop_assert_eq!(state.counter(), value);
    }

    #[test]
    fn lone_halve_truncates_toward_zero(value in -1_000_000i64..1_000_000) {
        let state = SharedState::new();
        state.set_counter(value);
        state.halve();
        prop_assert_eq!(state.counter(), value / 2);
    }
}

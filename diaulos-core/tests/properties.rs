//! Property tests for the ring buffer against a reference queue model.

use std::collections::VecDeque;

use diaulos_core::ring::RingBuffer;
use proptest::prelude::*;

proptest! {
    /// For any interleaving of pushes and pops, accepted bytes come back
    /// out in push order, and full/empty always agree with the model.
    #[test]
    fn fifo_law_holds(ops in proptest::collection::vec(any::<Option<u8>>(), 0..200)) {
        let mut ring = RingBuffer::<8>::new();
        let mut model = VecDeque::new();

        for op in ops {
            match op {
                Some(byte) => {
                    if ring.push(byte).is_ok() {
                        model.push_back(byte);
                    } else {
                        // Rejection may only happen at capacity - 1.
                        prop_assert_eq!(model.len(), 7);
                    }
                }
                None => {
                    prop_assert_eq!(ring.pop(), model.pop_front());
                }
            }
            prop_assert_eq!(ring.is_empty(), model.is_empty());
            prop_assert_eq!(ring.is_full(), model.len() == 7);
        }

        while let Some(byte) = ring.pop() {
            prop_assert_eq!(Some(byte), model.pop_front());
        }
        prop_assert!(model.is_empty());
    }
}

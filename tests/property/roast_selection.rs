//! Property tests for roast selection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use roastbot::roast::RoastSelector;
use roastbot::sweeper::roast_text;
use roastbot_proto::roast::RoastTier;

proptest! {
    #[test]
    fn message_always_belongs_to_its_tier(seed in any::<u64>(), draws in 1usize..64) {
        let selector = RoastSelector::seeded(seed);
        for _ in 0..draws {
            let roast = selector.select();
            prop_assert!(roast.tier.messages().contains(&roast.message));
            for other in RoastTier::ALL.iter().filter(|t| **t != roast.tier) {
                prop_assert!(!other.messages().contains(&roast.message));
            }
        }
    }

    #[test]
    fn same_seed_replays_same_roasts(seed in any::<u64>()) {
        let a = RoastSelector::seeded(seed);
        let b = RoastSelector::seeded(seed);
        for _ in 0..16 {
            prop_assert_eq!(a.select(), b.select());
        }
    }

    #[test]
    fn roast_text_names_task_then_message(
        description in "[a-zA-Z0-9 ]{1,40}",
        seed in any::<u64>(),
    ) {
        let roast = RoastSelector::seeded(seed).select();
        let text = roast_text(&description, &roast);
        let (head, message) = text.split_once('\n').unwrap();
        prop_assert_eq!(head, format!("You missed your task: '{description}'"));
        prop_assert_eq!(message, roast.message);
    }
}

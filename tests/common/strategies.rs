use proptest::prelude::*;

/// One step a test takes against an adapter and its scripted primitive
#[derive(Debug, Clone)]
pub enum Step {
    /// Publish while the primitive accepts (`true`) or rejects (`false`)
    Publish { accept: bool },
    /// Complete the oldest pending token with this raw code
    Complete { code: i32 },
}

pub fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        any::<bool>().prop_map(|accept| Step::Publish { accept }),
        prop_oneof![Just(0), Just(-160), Just(-100), -500i32..500]
            .prop_map(|code| Step::Complete { code }),
    ]
}

pub fn steps_strategy() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(step_strategy(), 0..64)
}

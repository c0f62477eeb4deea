pub const FULL: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "+git.",
    env!("TASKGROVE_GIT_COUNT"),
    ".",
    env!("TASKGROVE_GIT_SHA"),
    env!("TASKGROVE_GIT_DIRTY")
);

//! Stable index types for the engine's entity arenas.

use serde::{Deserialize, Serialize};
use tempus_common::ArenaId;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }
            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Identifies a pin in the pin arena.
    PinId
);
define_id!(
    /// Identifies a net in the net arena.
    NetId
);
define_id!(
    /// Identifies a gate in the gate arena.
    GateId
);
define_id!(
    /// Identifies a timing-graph node in the node arena.
    NodeId
);
define_id!(
    /// Identifies a timing-graph edge in the edge arena.
    EdgeId
);
define_id!(
    /// Identifies a jump (transitive shortcut) in the jump arena.
    JumpId
);
define_id!(
    /// Identifies a timing test in the test arena.
    TestId
);
define_id!(
    /// Identifies a parasitic node within one net's RC tree.
    RcNodeId
);

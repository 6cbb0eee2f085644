//! Page-side half: the drag-select gesture, link collection under the
//! rectangle, and the handoff to the coordinator.

pub mod collect;
pub mod driver;
pub mod headless;
pub mod machine;
pub mod messages;
pub mod page;
pub mod throttle;

pub use collect::{LinkSet, collect_links};
pub use driver::Selector;
pub use headless::{PageFixture, PageOp, ScriptedPage};
pub use machine::{Effect, Input, KeyPress, LinkSource, Phase, SelectionMachine};
pub use page::{Anchor, ConfirmPrompt, Notice, PageSurface, SelectionStyle};
pub use throttle::{COUNT_REFRESH_WINDOW, Throttle};

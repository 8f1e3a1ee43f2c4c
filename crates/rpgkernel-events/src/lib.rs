//! The audit + event + replay spine: every tool handler is wrapped by
//! [`audit::record_call`], publishes through [`bus::EventBus`], and the
//! resulting log can be fed back through [`replay::replay`] to
//! reconstruct state deterministically.

pub mod audit;
pub mod bus;
pub mod clock;
pub mod replay;

pub use audit::record_call;
pub use bus::{EventBus, Subscriber};
pub use clock::SimClock;
pub use replay::{replay, HandlerRegistry, ReplayHandler, ReplayReport};

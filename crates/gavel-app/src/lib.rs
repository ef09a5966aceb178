// Auction control logic: the control loop, the view-model it drives, and the
// timers and background tasks it owns.

pub mod app;
pub mod control;
pub mod countdown;
pub mod lock;
pub mod poller;
pub mod scope;

//! Bot decision making.
//!
//! Bots never get special movement rules: the controller only writes a
//! steering vector into each bot cell, which the motion pass then treats the
//! same way as a human intent.

mod bot;

pub use bot::{think, wander_heading};

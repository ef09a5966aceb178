// Terminal front-end for the auction control desk.

pub mod tui;

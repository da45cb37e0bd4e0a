pub mod clock;
pub mod display;

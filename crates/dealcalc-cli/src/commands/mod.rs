pub mod deal;
pub mod loan;
pub mod returns;
pub mod setup;

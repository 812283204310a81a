pub mod cash_flow;
pub mod dscr;
pub mod escalation;

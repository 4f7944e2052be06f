pub mod charts;
pub mod layout;

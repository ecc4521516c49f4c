pub mod constants;
pub mod dump;
pub mod options;
pub mod time;

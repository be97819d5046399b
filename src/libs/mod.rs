pub mod classify;
pub mod error;
pub mod io;
pub mod merge;
pub mod natord;
pub mod sam;
pub mod scanner;
pub mod select;

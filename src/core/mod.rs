//! Pure data components: nothing in here touches processes or signals.

pub mod history;
pub mod job;
pub mod parser;
pub mod variables;

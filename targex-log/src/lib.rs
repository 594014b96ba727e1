pub mod jsonl;
pub mod sink;

pub use jsonl::JsonlLogger;
pub use sink::{MemorySink, ResultsSink, Row, TableKind};

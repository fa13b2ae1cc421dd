//! AST visitor implementations for exuvia.

mod read_name_collector;

pub use read_name_collector::ReadNameCollector;

pub mod backend;
pub mod compiler;
pub mod page_count;

pub use backend::{Attempt, Backend, BackendChain, ChainOutcome, Miss};
pub use compiler::{CompileRequest, CompilerError, DocumentCompiler};
pub use page_count::{PageCountError, PageCounter};

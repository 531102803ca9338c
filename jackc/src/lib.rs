pub mod compile;
pub mod constants;
pub mod cursor;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod token_stream;
pub mod tokens;

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        compile::{CompilationEngine, CompileConf, Instr, ListProbe},
        driver::{compile_file, compile_path, BatchReport, DriverError},
        error::{CompileError, CompileResult},
    };
}

use compile::{CompilationEngine, CompileConf};
use error::CompileResult;

/// Compile the source of one class into VM code text, with default options.
pub fn compile_str(source: &str) -> CompileResult<String> {
    compile_with(source, &CompileConf::default())
}

pub fn compile_with(source: &str, conf: &CompileConf) -> CompileResult<String> {
    let code = CompilationEngine::new(source, conf.clone()).compile_class()?;
    Ok(compile::render(&code))
}

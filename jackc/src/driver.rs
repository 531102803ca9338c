//! Batch compilation of source files on disk.
use crate::{
    compile::{render, CompilationEngine, CompileConf},
    constants::{OUTPUT_EXT, SOURCE_EXT},
};
use itertools::Itertools;
use log::{debug, error, info, warn};
use std::{
    error, fmt, fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug)]
pub enum DriverError {
    /// Reading a source, listing a directory or writing an output failed.
    Io { path: PathBuf, source: io::Error },
    /// The source was read, but doesn't compile.
    ///
    /// The message is the rendered diagnostic, including the offending line.
    Compile { path: PathBuf, message: String },
}

impl DriverError {
    pub fn path(&self) -> &Path {
        match self {
            DriverError::Io { path, .. } | DriverError::Compile { path, .. } => path,
        }
    }

    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DriverError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            DriverError::Compile { path, message } => write!(f, "{}:{}", path.display(), message),
        }
    }
}

impl error::Error for DriverError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DriverError::Io { source, .. } => Some(source),
            DriverError::Compile { .. } => None,
        }
    }
}

/// Resolve the input path into the list of sources to compile.
///
/// A file is compiled as given. A directory contributes every source file
/// directly inside it, ordered by name. Subdirectories are not searched.
pub fn collect_sources(path: &Path) -> io::Result<Vec<PathBuf>> {
    if !path.is_dir() {
        // Surface a missing file as an error here, instead of when reading it.
        fs::metadata(path)?;
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = vec![];
    for entry in fs::read_dir(path)? {
        let file_path = entry?.path();
        if file_path.is_file() && file_path.extension().is_some_and(|ext| ext == SOURCE_EXT) {
            files.push(file_path);
        }
    }

    Ok(files.into_iter().sorted().collect())
}

/// Output file for a source file, placed next to it.
pub fn output_path(source_path: &Path) -> PathBuf {
    source_path.with_extension(OUTPUT_EXT)
}

/// Compile a source file into VM code text, without writing anything.
pub fn compile_source_file(path: &Path, conf: &CompileConf) -> Result<String, DriverError> {
    let source = fs::read_to_string(path).map_err(DriverError::io(path))?;

    let mut engine = CompilationEngine::new(&source, conf.clone());
    let code = engine.compile_class().map_err(|err| DriverError::Compile {
        path: path.to_path_buf(),
        message: err.render(&source),
    })?;
    debug!("{}: class {}, {} instructions", path.display(), engine.class_name(), code.len());

    Ok(render(&code))
}

/// Compile a source file and write the code beside it.
///
/// Returns the path of the written file. Nothing is written
/// when the source fails to compile.
pub fn compile_file(path: &Path, conf: &CompileConf) -> Result<PathBuf, DriverError> {
    let text = compile_source_file(path, conf)?;

    let out_path = output_path(path);
    fs::write(&out_path, text).map_err(DriverError::io(&out_path))?;

    Ok(out_path)
}

/// Outcome of compiling every source under a path.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Written output files.
    pub compiled: Vec<PathBuf>,
    pub failed: Vec<DriverError>,
}

impl BatchReport {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Compile a file, or every source file in a directory.
///
/// A file that fails is logged and skipped. The rest of the batch still runs.
pub fn compile_path(path: &Path, conf: &CompileConf) -> BatchReport {
    let mut report = BatchReport::default();

    let sources = match collect_sources(path) {
        Ok(sources) => sources,
        Err(err) => {
            let err = DriverError::io(path)(err);
            error!("{err}");
            report.failed.push(err);
            return report;
        }
    };

    if sources.is_empty() {
        warn!("no .{SOURCE_EXT} files in {}", path.display());
    }

    for source_path in sources {
        info!("compiling {}", source_path.display());

        match compile_file(&source_path, conf) {
            Ok(out_path) => {
                info!("wrote {}", out_path.display());
                report.compiled.push(out_path);
            }
            Err(err) => {
                error!("compilation error\n{err}");
                report.failed.push(err);
            }
        }
    }

    report
}

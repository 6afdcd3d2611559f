use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{convert_io_error, CliError};

/// Read a source file, or standard input for `-`.
pub fn read_source(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .map_err(|e| convert_io_error(e, PathBuf::from("<stdin>")))?;
        return Ok(contents);
    }
    std::fs::read_to_string(path).map_err(|e| convert_io_error(e, path.to_path_buf()))
}

/// Name used for a source in diagnostics.
pub fn display_name(path: &Path) -> String {
    if path == Path::new("-") {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No Git repositories found under {root} (scan depth {depth})")]
    NoRepositories { root: PathBuf, depth: usize },

    #[error("Scan root is not a directory: {path}")]
    InvalidRoot { path: PathBuf },
}

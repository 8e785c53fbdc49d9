//! The fatal error taxonomy for this engine.
//!
//! All variants are terminal: analysis either completes or fails, with no
//! partial success.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The 14-byte Go build-info magic was never found on a 16-byte
    /// boundary within the first 64 KiB of the data region.
    #[error("not a Go executable")]
    NotGoExecutable,

    /// The build-info decoder returned an empty module-info blob.
    #[error("could not read module info")]
    EmptyModuleInfo,

    /// The Go version string read back empty.
    #[error("no version found")]
    NoVersion,

    /// The module-info blob failed the 16-byte magic suffix/prefix check.
    #[error("binary is not built with go module support")]
    NoModuleSupport,

    /// The binary has no `.gopclntab` section, or it could not be decoded
    /// as a supported `pclntab` layout.
    #[error("no pcln table present in Go binary")]
    NoPclnTab,

    /// A file path matched a module key but split into a non-empty
    /// leading component, a structural inconsistency between the
    /// classifier's own prefix-stripping and the match it found.
    #[error("could not attribute file {file_name:?} to module {module_name:?}: path does not start with module key")]
    FileNameClassificationFailure { file_name: String, module_name: String },

    /// Propagated verbatim from the caller-supplied graph builder or PCLN
    /// decoder collaborator.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

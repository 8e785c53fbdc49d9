//! Go binary dependency-graph extraction engine.
//!
//! Given an already-parsed ELF image of a binary produced by the Go
//! toolchain, this crate reconstructs the main module identity, the
//! transitive list of dependency modules with their versions, and the set
//! of source packages compiled into the binary, then emits a dependency
//! graph keyed by `package@version`.
//!
//! The pipeline, leaf to root:
//!
//! 1. [`segment`] resolves virtual addresses to bytes.
//! 2. [`buildinfo`] locates and decodes the linker-embedded build-info blob.
//! 3. [`modinfo`] splits the module-info text into the module list.
//! 4. [`pclntab`] decodes `.gopclntab` into the compiled source file list.
//! 5. [`classify`] attributes each file to a module's package set.
//! 6. [`graph`] emits the final dependency graph.
//!
//! This crate does not parse ELF files itself, nor does it implement a
//! dependency-graph datatype: both are supplied by the caller through
//! [`model::ElfImage`] and [`graph::GraphBuilder`] respectively.

pub mod buildinfo;
pub mod classify;
pub mod error;
pub mod graph;
pub mod model;
pub mod modinfo;
pub mod pclntab;
pub mod segment;
mod varint;

pub use error::{AnalysisError, Result};
pub use graph::{GraphBuilder, PackageNode, PACKAGE_MANAGER};
pub use model::{ElfImage, Endianness, GoBinary, Module, ProgramSegment, Section, SegmentKind};

const GOPCLNTAB_SECTION: &str = ".gopclntab";

/// Runs the full pipeline over an ELF image: locates and decodes the
/// build-info blob, parses the module list, decodes the compiled file
/// list from `.gopclntab`, classifies files into module package sets, and
/// emits the dependency graph via the caller's [`GraphBuilder`].
///
/// Fails fast on any structural error: there is no partial result.
pub async fn analyze<B>(elf: &model::ElfImage) -> Result<B::Graph>
where
    B: GraphBuilder,
    B::NodeId: Clone + From<u64>,
{
    let go_binary = build_go_binary(elf)?;
    Ok(graph::emit::<B>(&go_binary).await)
}

/// The synchronous half of the pipeline: everything up to but not
/// including graph emission. Exposed separately so callers that already
/// have their own async boundary can drive emission themselves.
pub fn build_go_binary(elf: &model::ElfImage) -> Result<GoBinary> {
    let build_info = buildinfo::extract(elf)?;
    log::debug!("decoded go version {}", build_info.go_version);

    let (name, mut modules) = modinfo::parse(&build_info.module_info);

    let section = elf
        .section_by_name(GOPCLNTAB_SECTION)
        .ok_or(AnalysisError::NoPclnTab)?;
    let files = pclntab::decode_files(&section.data)?;
    log::debug!("decoded {} source file paths from .gopclntab", files.len());

    classify::classify(&mut modules, &files)?;

    Ok(GoBinary { name, modules })
}

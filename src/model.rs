//! The data model this engine operates over: the ELF image handed in by the
//! caller, and the `Module` / `GoBinary` types this engine reconstructs.

use indexmap::IndexSet;

/// Byte order of the binary under analysis.
///
/// The Go build-info header carries an explicit endianness flag; `pclntab`'s
/// own header has no such flag and is read in the binary's native order,
/// detected from the magic's byte pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Pointer width of the binary under analysis. Go's build-info header and
/// `pclntab` both carry their own `ptrSize` byte; only 4 and 8 are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtrSize {
    P32,
    P64,
}

impl PtrSize {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            4 => Some(PtrSize::P32),
            8 => Some(PtrSize::P64),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            PtrSize::P32 => 4,
            PtrSize::P64 => 8,
        }
    }
}

/// One section of the input ELF image.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub addr: u64,
    pub data: Vec<u8>,
}

/// One loadable program segment of the input ELF image.
#[derive(Debug, Clone)]
pub struct ProgramSegment {
    pub kind: SegmentKind,
    pub vaddr: u64,
    pub filesz: u64,
    pub writable: bool,
    pub data: Vec<u8>,
}

/// Program header type tag. Only `Load` is meaningful to this engine; other
/// kinds are carried through untouched for collaborators that need them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Load,
    Other,
}

/// An already-parsed ELF image, as produced by the caller's ELF parser.
///
/// This engine never parses raw ELF bytes itself; it only walks the
/// sections and program segments it is handed.
#[derive(Debug, Clone, Default)]
pub struct ElfImage {
    pub sections: Vec<Section>,
    pub programs: Vec<ProgramSegment>,
}

impl ElfImage {
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// A single Go module identity: `(name, version)`.
///
/// Built once per analysis; its package set is populated exactly once,
/// during classification, and is frozen after that.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    version: String,
    is_main: bool,
    packages: IndexSet<String>,
}

impl Module {
    pub fn new(name: impl Into<String>, version: impl Into<String>, is_main: bool) -> Self {
        Module {
            name: name.into(),
            version: version.into(),
            is_main,
            packages: IndexSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// `name + "@" + version`. Relies on the invariant that `version` never
    /// contains `@`.
    pub fn full_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// This module's packages, in the order they were first attributed
    /// during classification.
    pub fn packages(&self) -> &IndexSet<String> {
        &self.packages
    }

    /// Adds `pkg` to this module's package set if not already present.
    /// Called only during classification.
    pub(crate) fn add_package(&mut self, pkg: String) {
        self.packages.insert(pkg);
    }
}

/// The aggregate root: a binary's identity plus its full module list.
///
/// Invariant: at most one module is the main module.
#[derive(Debug, Clone)]
pub struct GoBinary {
    pub name: String,
    pub modules: Vec<Module>,
}

impl GoBinary {
    pub fn main_module(&self) -> Option<&Module> {
        self.modules.iter().find(|m| m.is_main())
    }
}

/// Sentinel file path the PCLN decoder may emit for autogenerated code. It
/// is never attributed to a module.
pub const AUTOGENERATED_FILE: &str = "<autogenerated>";

//! PCLN File Extractor: decodes `.gopclntab` to yield the ordered list of
//! source file paths compiled into the binary.
//!
//! This mirrors the Go runtime's `go12MapFiles` semantics (see
//! `go/src/debug/gosym/pclntab.go` for the upstream reference and
//! `runtime/symtab.go`'s `pcHeader` for the on-disk header this decodes),
//! generalized over pointer width and endianness: the header's integer
//! fields are read through a small `(Endianness, PtrSize)` dispatch rather
//! than an unsafe struct cast, so the same code path handles 32- and
//! 64-bit, little- and big-endian binaries.

use crate::error::{AnalysisError, Result};
use crate::model::{AUTOGENERATED_FILE, Endianness, PtrSize};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use log::{debug, warn};
use std::io::Cursor;

/// Known `.gopclntab` header magics, little-endian encoded. Go never flips
/// these per architecture; only the byte order they're stored in varies
/// with the binary's target endianness.
const MAGIC_GO1_2: u32 = 0xffff_fffb;
const MAGIC_GO1_16: u32 = 0xffff_fffa;
const MAGIC_GO1_18: u32 = 0xffff_fff0;
const MAGIC_GO1_20: u32 = 0xffff_fff1;

const FILE_INDEX_MISSING: u64 = u64::MAX & 0xffff_ffff; // cutab sentinel (^uint32(0))

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    Go1_2,
    Go1_16,
    Go1_18Plus,
}

struct Header {
    version: Version,
    endianness: Endianness,
    ptr_size: PtrSize,
    nfunc: u64,
    nfiles: u64,
    funcname_offset: u64,
    cu_offset: u64,
    filetab_offset: u64,
}

fn read_uint(data: &[u8], off: usize, width: usize, endianness: Endianness) -> Option<u64> {
    let slice = data.get(off..off + width)?;
    let mut cursor = Cursor::new(slice);
    match (endianness, width) {
        (Endianness::Little, 4) => cursor.read_u32::<LittleEndian>().map(u64::from).ok(),
        (Endianness::Little, 8) => cursor.read_u64::<LittleEndian>().ok(),
        (Endianness::Big, 4) => cursor.read_u32::<BigEndian>().map(u64::from).ok(),
        (Endianness::Big, 8) => cursor.read_u64::<BigEndian>().ok(),
        _ => None,
    }
}

fn detect_magic(data: &[u8]) -> Option<(Version, Endianness)> {
    let le = read_uint(data, 0, 4, Endianness::Little)? as u32;
    let version = |m: u32| match m {
        MAGIC_GO1_2 => Some(Version::Go1_2),
        MAGIC_GO1_16 => Some(Version::Go1_16),
        MAGIC_GO1_18 | MAGIC_GO1_20 => Some(Version::Go1_18Plus),
        _ => None,
    };
    if let Some(v) = version(le) {
        return Some((v, Endianness::Little));
    }
    let be = read_uint(data, 0, 4, Endianness::Big)? as u32;
    version(be).map(|v| (v, Endianness::Big))
}

fn parse_header(data: &[u8]) -> Option<Header> {
    let (version, endianness) = detect_magic(data)?;
    let ptr_size = PtrSize::from_byte(*data.get(7)?)?;
    let p = ptr_size.bytes();

    let nfunc = read_uint(data, 8, p, endianness)?;

    match version {
        Version::Go1_2 => Some(Header {
            version,
            endianness,
            ptr_size,
            nfunc,
            nfiles: 0,
            funcname_offset: 0,
            cu_offset: 0,
            filetab_offset: 8 + p as u64 /* functab base */ + nfunc * (2 * p as u64) + p as u64,
        }),
        Version::Go1_16 => {
            let nfiles = read_uint(data, 8 + p, p, endianness)?;
            let funcname_offset = read_uint(data, 8 + 2 * p, p, endianness)?;
            let cu_offset = read_uint(data, 8 + 3 * p, p, endianness)?;
            let filetab_offset = read_uint(data, 8 + 4 * p, p, endianness)?;
            Some(Header {
                version,
                endianness,
                ptr_size,
                nfunc,
                nfiles,
                funcname_offset,
                cu_offset,
                filetab_offset,
            })
        }
        Version::Go1_18Plus => {
            let nfiles = read_uint(data, 8 + p, p, endianness)?;
            // text_start occupies 8 + 2p..8 + 3p; unused for file extraction.
            let funcname_offset = read_uint(data, 8 + 3 * p, p, endianness)?;
            let cu_offset = read_uint(data, 8 + 4 * p, p, endianness)?;
            let filetab_offset = read_uint(data, 8 + 5 * p, p, endianness)?;
            Some(Header {
                version,
                endianness,
                ptr_size,
                nfunc,
                nfiles,
                funcname_offset,
                cu_offset,
                filetab_offset,
            })
        }
    }
}

/// Reads a NUL-terminated string at `offset` within `data`.
fn read_cstring(data: &[u8], offset: usize) -> String {
    match data.get(offset..) {
        Some(slice) => {
            let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
            String::from_utf8_lossy(&slice[..end]).into_owned()
        }
        None => String::new(),
    }
}

/// go1.2 layout: `filetab` begins with a `u32` file count, followed by that
/// many `u32` offsets, each an absolute byte offset of a NUL-terminated
/// path string within the whole `.gopclntab` blob.
fn files_go1_2(data: &[u8], header: &Header) -> Vec<String> {
    let base = header.filetab_offset as usize;
    let Some(count) = read_uint(data, base, 4, header.endianness) else {
        return Vec::new();
    };
    let mut files = Vec::with_capacity(count as usize);
    for i in 0..count {
        let entry_off = base + 4 + 4 * i as usize;
        let Some(off) = read_uint(data, entry_off, 4, header.endianness) else {
            break;
        };
        if off == 0 {
            continue;
        }
        files.push(read_cstring(data, off as usize));
    }
    files
}

/// go1.16+ layout: a flat `cutab` of `u32` entries, one per global file
/// index across every compilation unit, each indexing into `filetab` (a raw
/// string blob) to find the NUL-terminated path. `nfiles` in the header
/// bounds the total count directly, so no separate count word is needed.
fn files_go1_16_plus(data: &[u8], header: &Header) -> Vec<String> {
    let cutab = header.cu_offset as usize;
    let filetab = header.filetab_offset as usize;
    let mut files = Vec::with_capacity(header.nfiles as usize);
    for i in 0..header.nfiles {
        let Some(file_off) = read_uint(data, cutab + 4 * i as usize, 4, header.endianness) else {
            break;
        };
        if file_off == FILE_INDEX_MISSING {
            continue;
        }
        files.push(read_cstring(data, filetab + file_off as usize));
    }
    files
}

/// Decodes `.gopclntab` section bytes into the ordered list of source
/// file paths compiled into the binary, excluding the `<autogenerated>`
/// sentinel.
pub fn decode_files(section_bytes: &[u8]) -> Result<Vec<String>> {
    let header = parse_header(section_bytes).ok_or(AnalysisError::NoPclnTab)?;
    debug!(
        "parsed .gopclntab header: version={:?} ptr_size={:?} nfunc={} nfiles={}",
        header.version, header.ptr_size, header.nfunc, header.nfiles
    );

    let raw = match header.version {
        Version::Go1_2 => files_go1_2(section_bytes, &header),
        Version::Go1_16 | Version::Go1_18Plus => files_go1_16_plus(section_bytes, &header),
    };

    let files: Vec<String> = raw
        .into_iter()
        .filter(|f| !f.is_empty() && f != AUTOGENERATED_FILE)
        .collect();

    if files.is_empty() {
        warn!(".gopclntab decoded but yielded no source file paths");
    }
    Ok(files)
}

//! Build-Info Locator and Decoder: finds and decodes the 32-byte Go
//! build-info header embedded by the linker, recovering the Go version
//! string and the raw module-info blob.

use crate::error::{AnalysisError, Result};
use crate::model::{ElfImage, Endianness, ProgramSegment, PtrSize, SegmentKind};
use crate::segment;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use log::{trace, warn};
use std::io::Cursor;

const MAGIC: &[u8; 14] = b"\xff Go buildinf:";
const BUILD_INFO_ALIGN: u64 = 16;
const HEADER_LEN: usize = 32;
const SCAN_WINDOW: u64 = 64 * 1024;

/// Decoded build-info header fields.
struct Header<'a> {
    bytes: &'a [u8],
    ptr_size: PtrSize,
    endianness: Endianness,
    inline_strings: bool,
}

impl<'a> Header<'a> {
    fn parse(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let ptr_size = PtrSize::from_byte(bytes[14])?;
        let flags = bytes[15];
        let endianness = if flags & 1 != 0 {
            Endianness::Big
        } else {
            Endianness::Little
        };
        let inline_strings = flags & 2 != 0;
        Some(Header {
            bytes,
            ptr_size,
            endianness,
            inline_strings,
        })
    }

    fn read_uint(&self, off: usize, width: usize) -> Option<u64> {
        let slice = self.bytes.get(off..off + width)?;
        read_uint_bytes(slice, self.endianness)
    }
}

/// Interprets `bytes` (4 or 8 bytes) as an unsigned integer in the given
/// byte order. Both the header's own pointer fields and the string-header
/// words they point at are read this way. Returns `None` if `bytes` is
/// neither 4 nor 8 bytes long.
fn read_uint_bytes(bytes: &[u8], endianness: Endianness) -> Option<u64> {
    let mut cursor = Cursor::new(bytes);
    match (endianness, bytes.len()) {
        (Endianness::Little, 4) => cursor.read_u32::<LittleEndian>().map(u64::from).ok(),
        (Endianness::Little, 8) => cursor.read_u64::<LittleEndian>().ok(),
        (Endianness::Big, 4) => cursor.read_u32::<BigEndian>().map(u64::from).ok(),
        (Endianness::Big, 8) => cursor.read_u64::<BigEndian>().ok(),
        _ => None,
    }
}

/// Determines the data-start address for the build-info scan: the
/// `.go.buildinfo` section's address if present, else the first writable
/// loadable segment's address, else 0.
fn data_start_address(elf: &ElfImage) -> u64 {
    if let Some(section) = elf.section_by_name(".go.buildinfo") {
        return section.addr;
    }
    if let Some(seg) = elf
        .programs
        .iter()
        .find(|s| s.kind == SegmentKind::Load && s.writable)
    {
        return seg.vaddr;
    }
    0
}

/// Rounds `i` up to the next multiple of `BUILD_INFO_ALIGN` strictly
/// greater than `i`.
fn next_alignment_boundary(i: u64) -> u64 {
    (i / BUILD_INFO_ALIGN + 1) * BUILD_INFO_ALIGN
}

/// Scans the data region for the build-info magic aligned to a 16-byte
/// boundary, returning a header-prefixed slice of at least 32 bytes
/// starting at the match.
fn locate(buf: &[u8]) -> Option<&[u8]> {
    let mut i: u64 = 0;
    while (i as usize) + MAGIC.len() <= buf.len() {
        let start = i as usize;
        let rel = buf[start..].windows(MAGIC.len()).position(|w| w == MAGIC)?;
        let abs = i + rel as u64;
        if abs % BUILD_INFO_ALIGN == 0 {
            let abs_usize = abs as usize;
            if abs_usize + HEADER_LEN <= buf.len() {
                return Some(&buf[abs_usize..]);
            }
            return None;
        }
        trace!("skipping misaligned build-info magic candidate at offset {abs}");
        i = next_alignment_boundary(abs);
    }
    None
}

/// Reads a string addressed indirectly via a virtual address stored at
/// `header_off` within the build-info header: that address points at a
/// `(dataAddr, dataLen)` pair, which in turn addresses the string bytes.
fn read_indirect_string(
    programs: &[ProgramSegment],
    header: &Header,
    header_off: usize,
) -> String {
    let ptr_bytes = header.ptr_size.bytes();
    let ptr = match header.read_uint(header_off, ptr_bytes) {
        Some(p) => p,
        None => return String::new(),
    };

    let Some(hdr_bytes) = segment::read(programs, ptr, 2 * ptr_bytes as u64) else {
        return String::new();
    };
    if hdr_bytes.len() < 2 * ptr_bytes {
        return String::new();
    }

    let Some(data_addr) = read_uint_bytes(&hdr_bytes[..ptr_bytes], header.endianness) else {
        return String::new();
    };
    let Some(data_len) = read_uint_bytes(&hdr_bytes[ptr_bytes..2 * ptr_bytes], header.endianness)
    else {
        return String::new();
    };

    match segment::read(programs, data_addr, data_len) {
        Some(bytes) if bytes.len() as u64 == data_len => {
            String::from_utf8_lossy(bytes).into_owned()
        }
        _ => String::new(),
    }
}

/// The decoded build-info payload this engine needs downstream.
pub struct BuildInfo {
    pub go_version: String,
    pub module_info: String,
}

/// Locates and decodes the build-info blob, yielding the Go version and
/// the raw (already-unwrapped) module-info text.
pub fn extract(elf: &ElfImage) -> Result<BuildInfo> {
    let start = data_start_address(elf);
    let buf = match segment::read(&elf.programs, start, SCAN_WINDOW) {
        Some(b) => b,
        None => return Err(AnalysisError::NotGoExecutable),
    };

    let slice = locate(buf).ok_or(AnalysisError::NotGoExecutable)?;
    let header = Header::parse(slice).ok_or(AnalysisError::NotGoExecutable)?;

    let (go_version, module_info) = if header.inline_strings {
        let rest = &slice[HEADER_LEN..];
        let (version, rest) = crate::varint::decode_prefixed_string(rest);
        let (modinfo, _) = crate::varint::decode_prefixed_string(rest);
        (version, modinfo)
    } else {
        let ptr_bytes = header.ptr_size.bytes();
        let version = read_indirect_string(&elf.programs, &header, 16);
        let modinfo_raw = read_indirect_string(&elf.programs, &header, 16 + ptr_bytes);
        (version, modinfo_raw)
    };

    if go_version.is_empty() {
        return Err(AnalysisError::NoVersion);
    }

    let module_info = if header.inline_strings {
        module_info
    } else {
        unwrap_module_info(&module_info)?
    };

    if module_info.is_empty() {
        return Err(AnalysisError::EmptyModuleInfo);
    }

    Ok(BuildInfo {
        go_version,
        module_info,
    })
}

/// Strips the 16-byte magic framing that wraps the module-info blob in
/// pointer mode.
fn unwrap_module_info(raw: &str) -> Result<String> {
    let bytes = raw.as_bytes();
    if bytes.len() >= 33 && bytes[bytes.len() - 17] == b'\n' {
        Ok(String::from_utf8_lossy(&bytes[16..bytes.len() - 16]).into_owned())
    } else {
        warn!("module-info blob failed the 16-byte magic framing check");
        Err(AnalysisError::NoModuleSupport)
    }
}

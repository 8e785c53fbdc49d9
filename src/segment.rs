//! Segment Reader: resolves a virtual address + length to bytes by
//! scanning the program segment table. No errors; absence is `None`.

use crate::model::ProgramSegment;

/// Reads up to `size` bytes starting at virtual address `addr`, from the
/// first segment whose `[vaddr, vaddr + filesz)` range contains `addr`.
///
/// Returns fewer than `size` bytes if the segment doesn't extend that far;
/// callers that need an exact length must check the returned slice's
/// length themselves and treat a short read as a structural failure.
pub fn read(segments: &[ProgramSegment], addr: u64, size: u64) -> Option<&[u8]> {
    for seg in segments {
        let end = seg.vaddr.checked_add(seg.filesz)?;
        if addr >= seg.vaddr && addr < end {
            let start = (addr - seg.vaddr) as usize;
            let avail = end - addr;
            let take = size.min(avail) as usize;
            return seg.data.get(start..start + take);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SegmentKind;

    fn seg(vaddr: u64, data: &[u8]) -> ProgramSegment {
        ProgramSegment {
            kind: SegmentKind::Load,
            vaddr,
            filesz: data.len() as u64,
            writable: false,
            data: data.to_vec(),
        }
    }

    #[test]
    fn reads_within_a_single_segment() {
        let segs = vec![seg(0x1000, b"hello world")];
        assert_eq!(read(&segs, 0x1000, 5), Some(&b"hello"[..]));
        assert_eq!(read(&segs, 0x1006, 5), Some(&b"world"[..]));
    }

    #[test]
    fn truncates_short_reads_at_segment_end() {
        let segs = vec![seg(0x1000, b"hello")];
        assert_eq!(read(&segs, 0x1003, 10), Some(&b"lo"[..]));
    }

    #[test]
    fn returns_none_when_no_segment_covers_the_address() {
        let segs = vec![seg(0x1000, b"hello")];
        assert_eq!(read(&segs, 0x2000, 1), None);
    }

    #[test]
    fn selects_the_first_matching_segment_in_declared_order() {
        let segs = vec![seg(0x1000, b"first-"), seg(0x1000, b"second")];
        assert_eq!(read(&segs, 0x1000, 5), Some(&b"first"[..]));
    }
}

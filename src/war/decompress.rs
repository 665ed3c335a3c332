//! The archive's LZ decoder: byte-oriented, with a 4096-byte sliding window.
//!
//! The stream is a sequence of groups. Each group starts with one flag byte
//! whose bits are consumed lowest-first: a set bit is a literal byte, a clear
//! bit is a 16-bit back-reference with a 12-bit window offset in the low bits
//! and the run length minus 3 in the high nibble.

use crate::bytes::{Cursor, EndOfInput};

const WINDOW: usize = 0x1000;

pub(crate) fn inflate(src: &[u8], expected_len: usize) -> Result<Vec<u8>, EndOfInput> {
    let mut cur = Cursor::new(src);
    let mut out = Vec::with_capacity(expected_len);
    let mut window = [0u8; WINDOW];
    let mut wpos = 0usize;

    while out.len() < expected_len {
        let flags = cur.read_u8()?;
        for bit in 0..8 {
            if out.len() == expected_len {
                break;
            }
            if flags >> bit & 1 != 0 {
                let byte = cur.read_u8()?;
                window[wpos % WINDOW] = byte;
                wpos += 1;
                out.push(byte);
            } else {
                let reference = cur.read_u16()?;
                let mut offset = (reference & 0x0fff) as usize;
                let run = (reference >> 12) as usize + 3;
                for _ in 0..run {
                    if out.len() == expected_len {
                        break;
                    }
                    let byte = window[offset % WINDOW];
                    offset += 1;
                    window[wpos % WINDOW] = byte;
                    wpos += 1;
                    out.push(byte);
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_pass_through() {
        let src = [0xff, b'w', b'a', b'r', b'c', b'r', b'a', b'f', b't'];
        assert_eq!(inflate(&src, 8).unwrap(), b"warcraft");
    }

    #[test]
    fn references_copy_from_the_window() {
        // Literal 'A', then a reference to window slot 0 with run 3.
        let src = [0b0000_0001, b'A', 0x00, 0x00];
        assert_eq!(inflate(&src, 4).unwrap(), b"AAAA");
    }

    #[test]
    fn overlapping_reference_repeats_a_pair() {
        // Literals 'A','B', then offset 0 with run (1 + 3).
        let src = [0b0000_0011, b'A', b'B', 0x00, 0x10];
        assert_eq!(inflate(&src, 6).unwrap(), b"ABABAB");
    }

    #[test]
    fn truncated_stream_reports_end_of_input() {
        let src = [0xff, b'x'];
        assert_eq!(inflate(&src, 4), Err(EndOfInput));
    }

    #[test]
    fn run_is_clipped_at_the_expected_length() {
        // One literal, then a run of 18 into a 4-byte output.
        let src = [0b0000_0001, b'z', 0x00, 0xf0];
        assert_eq!(inflate(&src, 4).unwrap(), b"zzzz");
    }
}

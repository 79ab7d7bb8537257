//! Line assembly for the operator console.
//!
//! Bytes arrive in arbitrary USB packets; every complete non-empty line
//! becomes one notification payload. `\r`, `\n` and `\r\n` all end a line.
//! A line longer than the buffer is discarded whole once its terminator
//! shows up, so a peer never sees a truncated fragment.

use heapless::Vec;

pub type Line<const CAP: usize> = Vec<u8, CAP>;

pub struct LineBuffer<const CAP: usize> {
    buf: Vec<u8, CAP>,
    overflowed: bool,
}

impl<const CAP: usize> Default for LineBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> LineBuffer<CAP> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte; returns a line when `byte` completes one.
    pub fn push(&mut self, byte: u8) -> Option<Line<CAP>> {
        match byte {
            b'\r' | b'\n' => {
                let overflowed = core::mem::replace(&mut self.overflowed, false);
                let line = core::mem::take(&mut self.buf);
                (!overflowed && !line.is_empty()).then_some(line)
            }
            _ => {
                if self.buf.push(byte).is_err() {
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// `true` while the current line has outgrown the buffer.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<const CAP: usize>(lb: &mut LineBuffer<CAP>, bytes: &[u8]) -> std::vec::Vec<std::vec::Vec<u8>> {
        bytes
            .iter()
            .filter_map(|&b| lb.push(b))
            .map(|line| line.to_vec())
            .collect()
    }

    #[test]
    fn splits_on_any_terminator() {
        let mut lb = LineBuffer::<16>::new();
        let lines = feed(&mut lb, b"one\ntwo\r\nthree\r");
        assert_eq!(lines, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn empty_lines_are_skipped() {
        let mut lb = LineBuffer::<16>::new();
        assert!(feed(&mut lb, b"\r\n\n\r\r\n").is_empty());
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let mut lb = LineBuffer::<16>::new();
        assert!(feed(&mut lb, b"hel").is_empty());
        assert_eq!(feed(&mut lb, b"lo\n"), vec![b"hello".to_vec()]);
    }

    #[test]
    fn interior_spaces_preserved() {
        let mut lb = LineBuffer::<16>::new();
        assert_eq!(feed(&mut lb, b" a b \n"), vec![b" a b ".to_vec()]);
    }

    #[test]
    fn overlong_line_dropped_whole() {
        let mut lb = LineBuffer::<4>::new();
        assert!(feed(&mut lb, b"toolong").is_empty());
        assert!(lb.is_overflowed());
        assert!(feed(&mut lb, b"\n").is_empty());
        assert!(!lb.is_overflowed());
        assert_eq!(feed(&mut lb, b"ok\n"), vec![b"ok".to_vec()]);
    }

    #[test]
    fn exact_capacity_fits() {
        let mut lb = LineBuffer::<4>::new();
        assert_eq!(feed(&mut lb, b"abcd\n"), vec![b"abcd".to_vec()]);
    }

    #[test]
    fn clear_discards_pending_bytes() {
        let mut lb = LineBuffer::<8>::new();
        feed(&mut lb, b"stale");
        lb.clear();
        assert_eq!(feed(&mut lb, b"new\n"), vec![b"new".to_vec()]);
    }
}

//! Reusable DP buffers.
//!
//! Two flavours:
//! - [`BatchWorkspace`] is owned by each vectorized worker and holds the
//!   Structure-of-Arrays (SoA) buffers for lockstep lane execution. Buffers are
//!   resized per group and keep their capacity, so a worker stops allocating once
//!   it has seen its largest group.
//! - A thread-local [`ScalarRows`] pair backs the scalar recurrence, accessed via
//!   [`with_scalar_rows`].

use std::cell::RefCell;

/// Initial capacity, in bases, of the scalar DP rows.
const SCALAR_ROW_CAPACITY: usize = 512;

/// Sentinel for "no gap open yet" cells. Far enough from `i32::MIN` that
/// subtracting a penalty cannot wrap.
pub const NEG_INF: i32 = i32::MIN / 4;

thread_local! {
    static SCALAR_ROWS: RefCell<ScalarRows> = RefCell::new(ScalarRows::new());
}

/// Row buffers for the scalar recurrence: `h[j]` holds H of the previous row,
/// `f[j]` the vertical-gap score carried down column `j`.
#[derive(Debug, Default)]
pub struct ScalarRows {
    pub h: Vec<i32>,
    pub f: Vec<i32>,
}

impl ScalarRows {
    pub fn new() -> Self {
        Self {
            h: Vec::with_capacity(SCALAR_ROW_CAPACITY + 1),
            f: Vec::with_capacity(SCALAR_ROW_CAPACITY + 1),
        }
    }

    /// Reset both rows to the DP boundary for a horizontal sequence of `h_len`.
    pub fn reset(&mut self, h_len: usize) {
        self.h.clear();
        self.h.resize(h_len + 1, 0);
        self.f.clear();
        self.f.resize(h_len + 1, NEG_INF);
    }
}

/// Execute a closure with the thread-local scalar rows.
pub fn with_scalar_rows<F, R>(f: F) -> R
where
    F: FnOnce(&mut ScalarRows) -> R,
{
    SCALAR_ROWS.with(|rows| f(&mut rows.borrow_mut()))
}

/// SoA buffers for one vectorized DP step.
///
/// Sequences are laid out as `pos * lanes + lane`; per-lane parameters are
/// plain `lanes`-long vectors. Idle lanes carry zero lengths.
#[derive(Debug, Default)]
pub struct BatchWorkspace {
    pub lanes: usize,
    pub max_h: usize,
    pub max_v: usize,

    // Transposed sequences
    pub h_soa: Vec<u8>,
    pub v_soa: Vec<u8>,

    // DP rows, (max_h + 1) * lanes
    pub h_row: Vec<i32>,
    pub f_row: Vec<i32>,

    // Per-lane row state
    pub diag: Vec<i32>,
    pub h_left: Vec<i32>,
    pub e: Vec<i32>,

    // Per-lane parameters
    pub h_len: Vec<usize>,
    pub v_len: Vec<usize>,
    pub match_score: Vec<i32>,
    pub mismatch_penalty: Vec<i32>,
    pub gap_open_extend: Vec<i32>,
    pub gap_extend: Vec<i32>,

    // Per-lane best cell
    pub best: Vec<i32>,
    pub best_h: Vec<usize>,
    pub best_v: Vec<usize>,
}

impl BatchWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape every buffer for `lanes` lanes of at most `max_h` x `max_v` cells.
    ///
    /// All lanes start idle (zero length); callers fill the active ones.
    pub fn prepare(&mut self, lanes: usize, max_h: usize, max_v: usize) {
        self.lanes = lanes;
        self.max_h = max_h;
        self.max_v = max_v;

        reset(&mut self.h_soa, max_h * lanes, 0);
        reset(&mut self.v_soa, max_v * lanes, 0);
        reset(&mut self.h_row, (max_h + 1) * lanes, 0);
        reset(&mut self.f_row, (max_h + 1) * lanes, NEG_INF);

        reset(&mut self.diag, lanes, 0);
        reset(&mut self.h_left, lanes, 0);
        reset(&mut self.e, lanes, NEG_INF);

        reset(&mut self.h_len, lanes, 0);
        reset(&mut self.v_len, lanes, 0);
        reset(&mut self.match_score, lanes, 0);
        reset(&mut self.mismatch_penalty, lanes, 0);
        reset(&mut self.gap_open_extend, lanes, 0);
        reset(&mut self.gap_extend, lanes, 0);

        reset(&mut self.best, lanes, 0);
        reset(&mut self.best_h, lanes, 0);
        reset(&mut self.best_v, lanes, 0);
    }

    /// Bytes currently reserved across all buffers.
    pub fn reserved_bytes(&self) -> usize {
        self.h_soa.capacity()
            + self.v_soa.capacity()
            + 4 * (self.h_row.capacity()
                + self.f_row.capacity()
                + self.diag.capacity()
                + self.h_left.capacity()
                + self.e.capacity()
                + self.match_score.capacity()
                + self.mismatch_penalty.capacity()
                + self.gap_open_extend.capacity()
                + self.gap_extend.capacity()
                + self.best.capacity())
            + std::mem::size_of::<usize>()
                * (self.h_len.capacity()
                    + self.v_len.capacity()
                    + self.best_h.capacity()
                    + self.best_v.capacity())
    }
}

#[inline]
fn reset<T: Copy>(buf: &mut Vec<T>, len: usize, value: T) {
    buf.clear();
    buf.resize(len, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_reuses_buffers_for_same_shape() {
        let mut ws = BatchWorkspace::new();
        ws.prepare(8, 64, 64);
        let h_ptr = ws.h_row.as_ptr();
        let soa_ptr = ws.h_soa.as_ptr();

        ws.h_row[5] = 17;
        ws.prepare(8, 64, 64);

        assert_eq!(h_ptr, ws.h_row.as_ptr(), "h_row reallocated for identical shape");
        assert_eq!(soa_ptr, ws.h_soa.as_ptr(), "h_soa reallocated for identical shape");
        assert_eq!(ws.h_row[5], 0, "prepare must reset row contents");
        assert!(ws.f_row.iter().all(|&x| x == NEG_INF));
    }

    #[test]
    fn test_smaller_shape_keeps_capacity() {
        let mut ws = BatchWorkspace::new();
        ws.prepare(16, 128, 128);
        let reserved = ws.reserved_bytes();
        ws.prepare(4, 32, 32);
        assert_eq!(ws.reserved_bytes(), reserved);
        assert_eq!(ws.h_row.len(), 33 * 4);
    }

    #[test]
    fn test_scalar_rows_reset() {
        with_scalar_rows(|rows| {
            rows.reset(10);
            assert_eq!(rows.h.len(), 11);
            assert!(rows.h.iter().all(|&x| x == 0));
            assert!(rows.f.iter().all(|&x| x == NEG_INF));
        });
    }
}

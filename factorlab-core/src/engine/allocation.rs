//! Capital allocation for one book on a rebalance date.
//!
//! The budget (equity × pct / 100) is split evenly across the symbols that
//! carry the book's signal, then converted to units at today's close. A
//! non-finite unit count (zero or missing close) is clamped to 0 units; the
//! clamp changes portfolio composition and is reported to the caller.

use crate::domain::Signal;

/// Which book is being allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Long,
    Short,
}

impl BookSide {
    fn signal(self) -> Signal {
        match self {
            BookSide::Long => Signal::Long,
            BookSide::Short => Signal::Short,
        }
    }

    fn direction(self) -> f64 {
        match self {
            BookSide::Long => 1.0,
            BookSide::Short => -1.0,
        }
    }
}

/// Outcome for one signaled symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Allocation {
    Units(f64),
    /// Budget / close was infinite or undefined; the symbol gets 0 units.
    Clamped,
}

impl Allocation {
    pub fn units(self) -> f64 {
        match self {
            Allocation::Units(u) => u,
            Allocation::Clamped => 0.0,
        }
    }
}

/// Target units for one book, universe-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct BookTarget {
    pub units: Vec<f64>,
    /// Universe indices whose allocation was clamped.
    pub clamped: Vec<usize>,
    /// Number of symbols carrying this book's signal.
    pub count: usize,
}

/// Convert a per-symbol dollar budget into signed units at `close`.
pub fn target_units(per_symbol_budget: f64, close: f64, side: BookSide) -> Allocation {
    let units = per_symbol_budget / (side.direction() * close);
    if units.is_finite() {
        Allocation::Units(units)
    } else {
        Allocation::Clamped
    }
}

/// Allocate `equity × pct / 100` evenly across the symbols signaled for `side`.
///
/// Symbols without the book's signal get exactly 0. With no signaled symbols
/// every entry is 0.
pub fn allocate_book(
    side: BookSide,
    equity: f64,
    pct: f64,
    signals: &[Signal],
    close: &[f64],
) -> BookTarget {
    let wanted = side.signal();
    let count = signals.iter().filter(|&&s| s == wanted).count();
    let mut units = vec![0.0; signals.len()];
    let mut clamped = Vec::new();

    if count == 0 {
        return BookTarget {
            units,
            clamped,
            count,
        };
    }

    let per_symbol = equity * pct / 100.0 / count as f64;
    for (i, (&signal, &price)) in signals.iter().zip(close).enumerate() {
        if signal != wanted {
            continue;
        }
        match target_units(per_symbol, price, side) {
            Allocation::Units(u) => units[i] = u,
            Allocation::Clamped => clamped.push(i),
        }
    }

    BookTarget {
        units,
        clamped,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_budget_split_evenly() {
        let signals = [Signal::Long, Signal::Flat, Signal::Long];
        let close = [100.0, 50.0, 25.0];
        let target = allocate_book(BookSide::Long, 10_000.0, 70.0, &signals, &close);
        assert_eq!(target.count, 2);
        // 7000 / 2 = 3500 per symbol
        assert!((target.units[0] - 35.0).abs() < 1e-12);
        assert_eq!(target.units[1], 0.0);
        assert!((target.units[2] - 140.0).abs() < 1e-12);
        assert!(target.clamped.is_empty());
    }

    #[test]
    fn short_units_are_negative() {
        let signals = [Signal::Short, Signal::Long];
        let close = [20.0, 10.0];
        let target = allocate_book(BookSide::Short, 10_000.0, 30.0, &signals, &close);
        assert!((target.units[0] + 150.0).abs() < 1e-12);
        assert_eq!(target.units[1], 0.0);
    }

    #[test]
    fn no_signals_zeroes_every_entry() {
        let signals = [Signal::Flat, Signal::Short];
        let close = [20.0, 10.0];
        let target = allocate_book(BookSide::Long, 10_000.0, 100.0, &signals, &close);
        assert_eq!(target.count, 0);
        assert_eq!(target.units, vec![0.0, 0.0]);
    }

    #[test]
    fn zero_or_missing_close_is_clamped() {
        let signals = [Signal::Long, Signal::Long, Signal::Long];
        let close = [0.0, f64::NAN, 50.0];
        let target = allocate_book(BookSide::Long, 9_000.0, 100.0, &signals, &close);
        assert_eq!(target.clamped, vec![0, 1]);
        assert_eq!(target.units[0], 0.0);
        assert_eq!(target.units[1], 0.0);
        // The clamped symbols still consume their share of the budget.
        assert!((target.units[2] - 60.0).abs() < 1e-12);
    }

    #[test]
    fn target_units_branches() {
        assert_eq!(target_units(100.0, 4.0, BookSide::Long), Allocation::Units(25.0));
        assert_eq!(target_units(100.0, 4.0, BookSide::Short), Allocation::Units(-25.0));
        assert_eq!(target_units(100.0, 0.0, BookSide::Short), Allocation::Clamped);
        assert_eq!(Allocation::Clamped.units(), 0.0);
    }
}

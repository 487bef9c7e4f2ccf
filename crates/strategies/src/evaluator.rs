// In crates/strategies/src/evaluator.rs

use crate::trendline::SignalRow;
use core_types::Signal;

/// Turns the crossover flags of a confirmed row into a decision.
///
/// The flags are mutually exclusive for a non-negative threshold, but if
/// both are ever set the long side wins.
pub fn evaluate(confirmed: &SignalRow) -> Signal {
    if confirmed.long_cond {
        Signal::EnterLong
    } else if confirmed.short_cond {
        Signal::EnterShort
    } else {
        Signal::NoAction
    }
}

/// The most recent fully closed row: the last row belongs to the candle that
/// is still forming and is never evaluated.
pub fn confirmed_row(rows: &[SignalRow]) -> Option<&SignalRow> {
    rows.len().checked_sub(2).map(|index| &rows[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(open_time: i64, long_cond: bool, short_cond: bool) -> SignalRow {
        SignalRow {
            open_time,
            close: 1.0,
            sg: 1.0,
            slope_sg: None,
            trend: 1.0,
            trendline: None,
            slope_blue: None,
            min_move: 0.0,
            long_cond,
            short_cond,
        }
    }

    #[test]
    fn flags_map_to_signals() {
        assert_eq!(evaluate(&row(0, false, false)), Signal::NoAction);
        assert_eq!(evaluate(&row(0, true, false)), Signal::EnterLong);
        assert_eq!(evaluate(&row(0, false, true)), Signal::EnterShort);
    }

    #[test]
    fn long_wins_a_tie() {
        assert_eq!(evaluate(&row(0, true, true)), Signal::EnterLong);
    }

    #[test]
    fn confirmed_row_skips_the_forming_candle() {
        let rows = [row(0, false, false), row(1, true, false), row(2, false, true)];
        assert_eq!(confirmed_row(&rows).unwrap().open_time, 1);
        assert!(confirmed_row(&rows[..1]).is_none());
        assert!(confirmed_row(&[]).is_none());
    }
}

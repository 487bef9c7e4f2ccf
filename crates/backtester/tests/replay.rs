use backtester::Backtester;
use core_types::{Candle, CandleSeries, Side, Symbol, Timeframe};
use engine::Position;
use strategies::TrendlineSettings;

const SWING: [f64; 14] = [1.0, 1.01, 1.05, 1.02, 0.95, 0.9, 0.88, 0.9, 0.97, 1.0, 1.05, 1.02, 0.96, 0.93];

fn candles(closes: &[f64]) -> CandleSeries {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            open_time: 1_700_000_000_000 + i as i64 * 300_000,
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
            close_time: 1_700_000_000_000 + i as i64 * 300_000 + 299_999,
        })
        .collect();
    CandleSeries::new(candles).unwrap()
}

fn backtester() -> Backtester {
    let settings = TrendlineSettings {
        sg_length: 2,
        slope_length: 2,
        sma_length: 2,
        sensitivity: 0.001,
    };
    Backtester::new(Symbol::from("TEST"), Timeframe::M5, settings).unwrap()
}

#[test]
fn swing_series_replay() {
    let report = backtester().run(&candles(&SWING)).unwrap();

    assert_eq!(report.candles, 14);
    assert_eq!(report.buy_signals, 1);
    assert_eq!(report.sell_signals, 2);

    // Short at 0.95, reversed long at 0.97, reversed short at 0.96.
    assert_eq!(report.trades.len(), 2);
    assert_eq!(report.trades[0].side, Side::Short);
    assert!((report.trades[0].pnl - (0.95 - 0.97)).abs() < 1e-12);
    assert_eq!(report.trades[1].side, Side::Long);
    assert!((report.trades[1].pnl - (0.96 - 0.97)).abs() < 1e-12);

    assert!((report.realized_pnl - -0.03).abs() < 1e-12);
    assert_eq!(report.winning_trades, 0);
    assert_eq!(report.win_rate(), 0.0);
    assert!(matches!(report.final_position, Position::Short { entry_price, .. } if entry_price == 0.96));
    assert_eq!(report.equity_curve.len(), 14);
    assert!((report.max_drawdown - 0.03).abs() < 1e-12);
}

#[test]
fn replay_of_an_empty_series_is_empty() {
    let report = backtester().run(&CandleSeries::default()).unwrap();
    assert_eq!(report.candles, 0);
    assert!(report.trades.is_empty());
    assert_eq!(report.final_position, Position::Flat);
}

#[test]
fn report_serializes_to_json() {
    let report = backtester().run(&candles(&SWING)).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["symbol"], "TEST");
    assert_eq!(json["timeframe"], "5m");
    assert_eq!(json["trades"].as_array().unwrap().len(), 2);
}

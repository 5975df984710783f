//! Trend and momentum indicators over a close-price series.
//!
//! The moving averages are seeded with a simple average of their first
//! `period` inputs and stay undefined (`None`) until then, so a value is
//! only reported once the full lookback has been seen.

use common::TradeError;
use common::models::{Candle, candle::closes};
use ta::errors::{Result as TaResult, TaError};
use ta::{Next, Reset};

pub const EMA_FAST: usize = 20;
pub const EMA_MID: usize = 50;
pub const EMA_SLOW: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Bars needed before every indicator is defined on the latest bar.
pub const MIN_HISTORY: usize = EMA_SLOW;

/// Indicator values on the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema_fast: f64,
    pub ema_mid: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
}

/// EMA with smoothing factor `2 / (n + 1)`, seeded by the SMA of the first `n` inputs.
#[derive(Debug, Clone)]
pub struct SeededEma {
    period: usize,
    k: f64,
    seen: usize,
    seed_sum: f64,
    current: Option<f64>,
}

impl SeededEma {
    pub fn new(period: usize) -> TaResult<Self> {
        if period == 0 {
            return Err(TaError::InvalidParameter);
        }
        Ok(Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seen: 0,
            seed_sum: 0.0,
            current: None,
        })
    }
}

impl Next<f64> for SeededEma {
    type Output = Option<f64>;

    fn next(&mut self, input: f64) -> Self::Output {
        self.current = match self.current {
            Some(prev) => Some(input * self.k + prev * (1.0 - self.k)),
            None => {
                self.seen += 1;
                self.seed_sum += input;
                (self.seen == self.period).then(|| self.seed_sum / self.period as f64)
            }
        };
        self.current
    }
}

impl Reset for SeededEma {
    fn reset(&mut self) {
        self.seen = 0;
        self.seed_sum = 0.0;
        self.current = None;
    }
}

/// Wilder's RSI: average gain/loss seeded by a simple mean over the first
/// `period` changes, then smoothed with `(prev * (n - 1) + x) / n`.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    period: usize,
    prev_close: Option<f64>,
    changes: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl WilderRsi {
    pub fn new(period: usize) -> TaResult<Self> {
        if period == 0 {
            return Err(TaError::InvalidParameter);
        }
        Ok(Self {
            period,
            prev_close: None,
            changes: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        })
    }

    fn value(&self) -> f64 {
        if self.avg_loss == 0.0 {
            return 100.0;
        }
        let rs = self.avg_gain / self.avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

impl Next<f64> for WilderRsi {
    type Output = Option<f64>;

    fn next(&mut self, input: f64) -> Self::Output {
        let Some(prev) = self.prev_close.replace(input) else {
            return None;
        };

        let change = input - prev;
        let (gain, loss) = (change.max(0.0), (-change).max(0.0));
        let n = self.period as f64;
        self.changes += 1;

        if self.changes <= self.period {
            self.avg_gain += gain / n;
            self.avg_loss += loss / n;
            if self.changes < self.period {
                return None;
            }
        } else {
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }

        Some(self.value())
    }
}

impl Reset for WilderRsi {
    fn reset(&mut self) {
        self.prev_close = None;
        self.changes = 0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD line = fast EMA - slow EMA; signal = EMA of the MACD line.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: SeededEma,
    slow: SeededEma,
    signal: SeededEma,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> TaResult<Self> {
        if fast >= slow {
            return Err(TaError::InvalidParameter);
        }
        Ok(Self {
            fast: SeededEma::new(fast)?,
            slow: SeededEma::new(slow)?,
            signal: SeededEma::new(signal)?,
        })
    }
}

impl Next<f64> for Macd {
    type Output = Option<MacdOutput>;

    fn next(&mut self, input: f64) -> Self::Output {
        let fast = self.fast.next(input);
        let slow = self.slow.next(input);
        let macd = fast.zip(slow).map(|(f, s)| f - s)?;
        let signal = self.signal.next(macd)?;
        Some(MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        })
    }
}

impl Reset for Macd {
    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
    }
}

struct IndicatorSet {
    ema_fast: SeededEma,
    ema_mid: SeededEma,
    ema_slow: SeededEma,
    rsi: WilderRsi,
    macd: Macd,
}

impl IndicatorSet {
    fn standard() -> TaResult<Self> {
        Ok(Self {
            ema_fast: SeededEma::new(EMA_FAST)?,
            ema_mid: SeededEma::new(EMA_MID)?,
            ema_slow: SeededEma::new(EMA_SLOW)?,
            rsi: WilderRsi::new(RSI_PERIOD)?,
            macd: Macd::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)?,
        })
    }
}

/// Runs every indicator over `closes` and returns the values on the last bar.
pub fn snapshot(closes: &[f64]) -> Result<IndicatorSnapshot, TradeError> {
    let insufficient = TradeError::InsufficientHistory {
        have: closes.len(),
        need: MIN_HISTORY,
    };
    if closes.len() < MIN_HISTORY {
        return Err(insufficient);
    }

    let mut set = IndicatorSet::standard().map_err(|_| insufficient.clone())?;
    let mut last = (None, None, None, None, None);
    for &close in closes {
        last = (
            set.ema_fast.next(close),
            set.ema_mid.next(close),
            set.ema_slow.next(close),
            set.rsi.next(close),
            set.macd.next(close),
        );
    }

    match last {
        (Some(ema_fast), Some(ema_mid), Some(ema_slow), Some(rsi), Some(macd)) => {
            Ok(IndicatorSnapshot {
                ema_fast,
                ema_mid,
                ema_slow,
                rsi,
                macd: macd.macd,
                macd_signal: macd.signal,
                macd_hist: macd.histogram,
            })
        }
        _ => Err(insufficient),
    }
}

pub fn snapshot_from_candles(candles: &[Candle]) -> Result<IndicatorSnapshot, TradeError> {
    snapshot(&closes(candles))
}

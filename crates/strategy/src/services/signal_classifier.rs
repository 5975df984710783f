use common::models::{Direction, Signal};
use tracing::debug;

use crate::indicators::IndicatorSnapshot;

struct Tier {
    condition: fn(&IndicatorSnapshot) -> bool,
    direction: Direction,
    notes: &'static str,
    score: u8,
}

fn uptrend(s: &IndicatorSnapshot) -> bool {
    s.ema_fast > s.ema_mid
}

fn downtrend(s: &IndicatorSnapshot) -> bool {
    s.ema_fast < s.ema_mid
}

/// Highest conviction first. Tier 5 repeats tier 3's condition at a lower
/// score and can never win; it is kept so scores match the live bot.
const TIERS: [Tier; 8] = [
    Tier {
        condition: |s| uptrend(s) && s.rsi < 40.0 && s.macd > s.macd_signal && s.macd_hist > 0.0,
        direction: Direction::Long,
        notes: "Perfect match for LONG",
        score: 100,
    },
    Tier {
        condition: |s| downtrend(s) && s.rsi > 60.0 && s.macd < s.macd_signal && s.macd_hist < 0.0,
        direction: Direction::Short,
        notes: "Perfect match for SHORT",
        score: 100,
    },
    Tier {
        condition: |s| uptrend(s) && s.rsi < 50.0,
        direction: Direction::Long,
        notes: "Close match for LONG",
        score: 80,
    },
    Tier {
        condition: |s| downtrend(s) && s.rsi > 50.0,
        direction: Direction::Short,
        notes: "Close match for SHORT",
        score: 80,
    },
    Tier {
        condition: |s| uptrend(s) && s.rsi < 50.0,
        direction: Direction::Long,
        notes: "Ignoring MACD - LONG",
        score: 60,
    },
    Tier {
        condition: |s| downtrend(s) && s.rsi > 50.0,
        direction: Direction::Short,
        notes: "Ignoring MACD - SHORT",
        score: 60,
    },
    Tier {
        condition: uptrend,
        direction: Direction::Long,
        notes: "Ignoring RSI - LONG",
        score: 40,
    },
    Tier {
        condition: downtrend,
        direction: Direction::Short,
        notes: "Ignoring RSI - SHORT",
        score: 40,
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub direction: Direction,
    pub score: u8,
    pub rationale: String,
}

/// The EMA200 trend filter: longs only above it, shorts only below.
fn aligned_with_trend(direction: Direction, s: &IndicatorSnapshot) -> bool {
    match direction {
        Direction::Long => s.ema_fast > s.ema_slow,
        Direction::Short => s.ema_fast < s.ema_slow,
    }
}

/// Walks the tier cascade and returns the first tier that both matches and
/// agrees with the EMA200 trend, or `None` when nothing qualifies.
pub fn classify(snapshot: &IndicatorSnapshot) -> Option<Classification> {
    debug!(
        "Indicators | EMA20: {:.4}, EMA50: {:.4}, EMA200: {:.4}, RSI: {:.2}, MACD: {:.4}, Signal: {:.4}, Hist: {:.4}",
        snapshot.ema_fast,
        snapshot.ema_mid,
        snapshot.ema_slow,
        snapshot.rsi,
        snapshot.macd,
        snapshot.macd_signal,
        snapshot.macd_hist
    );

    for (attempt, tier) in TIERS.iter().enumerate().map(|(i, t)| (i + 1, t)) {
        if !(tier.condition)(snapshot) {
            debug!("[ATTEMPT {}] {} not satisfied", attempt, tier.notes);
            continue;
        }
        if !aligned_with_trend(tier.direction, snapshot) {
            debug!(
                "[ATTEMPT {}] {} matched but not aligned with EMA200 trend",
                attempt, tier.notes
            );
            continue;
        }

        debug!("[ATTEMPT {}] {} confirmed by EMA200", attempt, tier.notes);
        return Some(Classification {
            direction: tier.direction,
            score: tier.score,
            rationale: format!("[Attempt {}] {} | Confirmed by EMA200", attempt, tier.notes),
        });
    }

    None
}

pub fn signal_for(symbol: &str, snapshot: &IndicatorSnapshot) -> Option<Signal> {
    classify(snapshot).map(|c| Signal {
        symbol: symbol.to_string(),
        direction: c.direction,
        confidence_score: c.score,
        rationale: c.rationale,
    })
}

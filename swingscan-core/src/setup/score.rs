//! SmartScore: a 0–100 ranking heuristic, not a probability.
//!
//! Starts at 50. Breakouts earn credit for RSI above 50 and band position
//! above the midline; pullbacks for RSI below 60 and band position below the
//! midline. Each term is capped. Trend alignment adds or removes 10; an
//! optional sector check adds 10 or removes 5.

use super::SetupKind;

pub const BASELINE: f64 = 50.0;
pub const RSI_WEIGHT: f64 = 1.2;
pub const RSI_CAP: f64 = 25.0;
pub const BAND_WEIGHT: f64 = 50.0;
pub const BAND_CAP: f64 = 15.0;
pub const TREND_BONUS: f64 = 10.0;
pub const SECTOR_BONUS: f64 = 10.0;
pub const SECTOR_PENALTY: f64 = 5.0;

/// Inputs for [`smart_score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub setup: SetupKind,
    pub rsi: f64,
    pub band: f64,
    pub ema_uptrend: bool,
    /// `None` when no favored-sector context was supplied.
    pub sector_aligned: Option<bool>,
}

pub fn smart_score(inputs: &ScoreInputs) -> f64 {
    let mut score = BASELINE;

    match inputs.setup {
        SetupKind::Breakout => {
            score += ((inputs.rsi - 50.0) * RSI_WEIGHT).min(RSI_CAP);
            score += ((inputs.band - 0.5) * BAND_WEIGHT).min(BAND_CAP);
        }
        SetupKind::Pullback => {
            score += ((60.0 - inputs.rsi) * RSI_WEIGHT).min(RSI_CAP);
            score += ((0.5 - inputs.band) * BAND_WEIGHT).min(BAND_CAP);
        }
        SetupKind::NearMiss | SetupKind::None => {}
    }

    score += if inputs.ema_uptrend {
        TREND_BONUS
    } else {
        -TREND_BONUS
    };

    match inputs.sector_aligned {
        Some(true) => score += SECTOR_BONUS,
        Some(false) => score -= SECTOR_PENALTY,
        None => {}
    }

    if score.is_nan() {
        return BASELINE;
    }
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(setup: SetupKind, rsi: f64, band: f64) -> ScoreInputs {
        ScoreInputs {
            setup,
            rsi,
            band,
            ema_uptrend: true,
            sector_aligned: None,
        }
    }

    #[test]
    fn breakout_known_value() {
        // 50 + 10*1.2 + 0.2*50 + 10 = 82
        let s = smart_score(&inputs(SetupKind::Breakout, 60.0, 0.7));
        assert!((s - 82.0).abs() < 1e-9);
    }

    #[test]
    fn pullback_known_value() {
        // 50 + 15*1.2 + 0.1*50 + 10 = 83
        let s = smart_score(&inputs(SetupKind::Pullback, 45.0, 0.4));
        assert!((s - 83.0).abs() < 1e-9);
    }

    #[test]
    fn terms_are_capped_and_total_clamped() {
        // 50 + 25 + 15 + 10 + 10 = 110 → 100
        let mut i = inputs(SetupKind::Breakout, 90.0, 1.5);
        i.sector_aligned = Some(true);
        assert_eq!(smart_score(&i), 100.0);
    }

    #[test]
    fn near_miss_gets_only_trend_and_sector() {
        let mut i = inputs(SetupKind::NearMiss, 45.0, 0.4);
        i.ema_uptrend = false;
        i.sector_aligned = Some(false);
        assert_eq!(smart_score(&i), 35.0);
    }

    #[test]
    fn never_negative() {
        // Terms are capped above but not below.
        let mut i = inputs(SetupKind::Breakout, 0.0, -2.0);
        i.ema_uptrend = false;
        assert_eq!(smart_score(&i), 0.0);
    }
}

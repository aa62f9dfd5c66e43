//! Intrinsic-value engine: DCF with a CAPM hurdle rate, sector-relative
//! PE scoring, ATR-based target bands and an aggregate valuation status.

use crate::domain::fundamentals::{safe_f64, Fundamentals};
use crate::domain::indicator::IndicatorFrame;
use serde::Serialize;

/// Indian 10Y bond yield, the risk-free leg of the CAPM hurdle.
pub const RISK_FREE_RATE: f64 = 0.07;
/// Expected equity market premium over the risk-free rate.
pub const MARKET_PREMIUM: f64 = 0.05;
/// Long-term growth after the explicit projection window.
pub const TERMINAL_GROWTH: f64 = 0.03;
/// Explicit DCF projection window in years.
pub const DCF_YEARS: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DcfAssumptions {
    pub eps: f64,
    pub growth_rate_pct: f64,
    pub discount_rate_pct: f64,
    pub terminal_growth_pct: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DcfVerdict {
    Undervalued,
    #[serde(rename = "Fair Value")]
    FairValue,
    Overvalued,
}

#[derive(Debug, Clone, Serialize)]
pub struct DcfValuation {
    pub intrinsic_value: f64,
    pub present_value_earnings: f64,
    pub terminal_value: f64,
    /// (intrinsic - price) / intrinsic, percent. None when either side is
    /// non-positive.
    pub margin_of_safety: Option<f64>,
    pub verdict: Option<DcfVerdict>,
    pub assumptions: DcfAssumptions,
}

/// Discount a projected EPS stream plus a Gordon-growth terminal value.
/// Non-positive earnings are worth nothing here; negative-EPS businesses
/// get a zero intrinsic value rather than a nonsense projection.
pub fn dcf_value(eps: f64, growth_rate: f64, discount_rate: f64) -> DcfValuation {
    let assumptions = DcfAssumptions {
        eps,
        growth_rate_pct: growth_rate * 100.0,
        discount_rate_pct: discount_rate * 100.0,
        terminal_growth_pct: TERMINAL_GROWTH * 100.0,
        years: DCF_YEARS,
    };

    if eps <= 0.0 {
        return DcfValuation {
            intrinsic_value: 0.0,
            present_value_earnings: 0.0,
            terminal_value: 0.0,
            margin_of_safety: None,
            verdict: None,
            assumptions,
        };
    }

    let mut pv_earnings = 0.0;
    let mut projected = eps;
    for year in 1..=DCF_YEARS {
        projected *= 1.0 + growth_rate;
        pv_earnings += projected / (1.0 + discount_rate).powi(year as i32);
    }

    let final_eps = eps * (1.0 + growth_rate).powi(DCF_YEARS as i32);
    let terminal = (final_eps * (1.0 + TERMINAL_GROWTH)) / (discount_rate - TERMINAL_GROWTH);
    let terminal_pv = terminal / (1.0 + discount_rate).powi(DCF_YEARS as i32);

    DcfValuation {
        intrinsic_value: pv_earnings + terminal_pv,
        present_value_earnings: pv_earnings,
        terminal_value: terminal_pv,
        margin_of_safety: None,
        verdict: None,
        assumptions,
    }
}

impl DcfValuation {
    /// Attach the margin of safety against a live price. ±15% bands
    /// separate undervalued / fair / overvalued.
    pub fn with_price(mut self, current_price: f64) -> Self {
        if self.intrinsic_value > 0.0 && current_price > 0.0 {
            let margin = (self.intrinsic_value - current_price) / self.intrinsic_value * 100.0;
            self.margin_of_safety = Some(margin);
            self.verdict = Some(if margin > 15.0 {
                DcfVerdict::Undervalued
            } else if margin > -15.0 {
                DcfVerdict::FairValue
            } else {
                DcfVerdict::Overvalued
            });
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HurdleRate {
    pub rate_pct: f64,
    pub risk_free_pct: f64,
    pub beta: f64,
    pub market_premium_pct: f64,
    pub interpretation: &'static str,
}

/// CAPM: risk-free rate plus beta times the market premium.
pub fn hurdle_rate(beta: f64) -> HurdleRate {
    let rate = RISK_FREE_RATE + beta * MARKET_PREMIUM;
    HurdleRate {
        rate_pct: rate * 100.0,
        risk_free_pct: RISK_FREE_RATE * 100.0,
        beta,
        market_premium_pct: MARKET_PREMIUM * 100.0,
        interpretation: interpret_hurdle(rate),
    }
}

fn interpret_hurdle(rate: f64) -> &'static str {
    if rate < 0.10 {
        "Low risk, suitable for conservative investors"
    } else if rate < 0.14 {
        "Moderate risk, average market return expected"
    } else if rate < 0.18 {
        "Higher risk, requires above-average returns"
    } else {
        "High risk, speculative investment"
    }
}

/// Sustainable-growth estimate: retention ratio (0.6) times ROE, clamped
/// to [5%, 25%].
pub fn growth_from_roe(roe_pct: f64) -> f64 {
    (roe_pct / 100.0 * 0.6).clamp(0.05, 0.25)
}

const SECTOR_PE: &[(&str, f64)] = &[
    ("IT", 25.0),
    ("Banking", 15.0),
    ("FMCG", 35.0),
    ("Pharma", 25.0),
    ("Automobile", 20.0),
    ("Oil & Gas", 12.0),
    ("Metals", 10.0),
    ("Power", 12.0),
    ("Infrastructure", 18.0),
    ("Finance", 20.0),
    ("Insurance", 25.0),
    ("Telecom", 15.0),
    ("Cement", 18.0),
    ("Consumer Durables", 30.0),
    ("Healthcare", 28.0),
    ("Mining", 10.0),
    ("Conglomerate", 20.0),
    ("General", 20.0),
];

/// Benchmark PE for a sector; unknown sectors use the general 20x.
pub fn sector_pe(sector: &str) -> f64 {
    SECTOR_PE
        .iter()
        .find(|(name, _)| *name == sector)
        .map(|(_, pe)| *pe)
        .unwrap_or(20.0)
}

/// Score a trailing PE against its sector benchmark. Lower multiples
/// score higher; missing or negative PE is neutral.
pub fn pe_score(pe_ratio: f64, sector: &str) -> f64 {
    if pe_ratio <= 0.0 || !pe_ratio.is_finite() {
        return 50.0;
    }
    let benchmark = sector_pe(sector);
    if pe_ratio < benchmark * 0.5 {
        90.0
    } else if pe_ratio < benchmark * 0.75 {
        75.0
    } else if pe_ratio < benchmark {
        60.0
    } else if pe_ratio < benchmark * 1.5 {
        40.0
    } else {
        20.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetStance {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "CAUTION")]
    Caution,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetPrices {
    pub buy_conservative: f64,
    pub buy_aggressive: f64,
    pub sell_conservative: f64,
    pub sell_aggressive: f64,
    pub upside_conservative_pct: f64,
    pub upside_aggressive_pct: f64,
    pub downside_pct: f64,
    pub risk_reward_ratio: f64,
    pub stance: TargetStance,
}

/// ATR-band entry and exit levels clamped to the 52-week range, nudged
/// by the DCF view when it strongly disagrees with the market.
pub fn target_prices(
    current_price: f64,
    atr: Option<f64>,
    high_52w: Option<f64>,
    low_52w: Option<f64>,
    dcf_value: Option<f64>,
) -> Option<TargetPrices> {
    if current_price <= 0.0 {
        return None;
    }

    let atr = safe_f64(atr, current_price * 0.02);
    let high_52w = high_52w.unwrap_or(current_price * 1.2);
    let low_52w = low_52w.unwrap_or(current_price * 0.8);

    let mut buy_conservative = (current_price - 2.0 * atr).max(low_52w * 0.95);
    let buy_aggressive = (current_price - 1.5 * atr).max(low_52w);
    let mut sell_conservative = (current_price + 2.0 * atr).min(high_52w * 0.95);
    let sell_aggressive = (current_price + 3.0 * atr).min(high_52w);

    if let Some(iv) = dcf_value.filter(|&iv| iv > 0.0) {
        if iv > current_price * 1.2 {
            buy_conservative = (buy_conservative * 1.05).min(current_price * 0.98);
        }
        if iv < current_price * 0.8 {
            sell_conservative = (sell_conservative * 0.95).max(current_price * 1.02);
        }
    }

    let upside_conservative = (sell_conservative - current_price) / current_price * 100.0;
    let upside_aggressive = (sell_aggressive - current_price) / current_price * 100.0;
    let downside = (current_price - buy_conservative) / current_price * 100.0;
    let risk_reward = if downside > 0.0 {
        upside_conservative / downside
    } else {
        0.0
    };

    let stance = if risk_reward >= 2.0 {
        TargetStance::Buy
    } else if risk_reward >= 1.0 {
        TargetStance::Hold
    } else {
        TargetStance::Caution
    };

    Some(TargetPrices {
        buy_conservative,
        buy_aggressive,
        sell_conservative,
        sell_aggressive,
        upside_conservative_pct: upside_conservative,
        upside_aggressive_pct: upside_aggressive,
        downside_pct: downside,
        risk_reward_ratio: risk_reward,
        stance,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketCapCategory {
    #[serde(rename = "Large Cap")]
    Large,
    #[serde(rename = "Mid Cap")]
    Mid,
    #[serde(rename = "Small Cap")]
    Small,
    #[serde(rename = "Micro Cap")]
    Micro,
    Unknown,
}

/// Categorize by market cap in INR crores.
pub fn market_cap_category(market_cap: f64) -> MarketCapCategory {
    if market_cap <= 0.0 {
        return MarketCapCategory::Unknown;
    }
    let crores = market_cap / 1e7;
    if crores >= 100_000.0 {
        MarketCapCategory::Large
    } else if crores >= 20_000.0 {
        MarketCapCategory::Mid
    } else if crores >= 5_000.0 {
        MarketCapCategory::Small
    } else {
        MarketCapCategory::Micro
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValuationBand {
    Undervalued,
    #[serde(rename = "Slightly Undervalued")]
    SlightlyUndervalued,
    #[serde(rename = "Fair Value")]
    FairValue,
    #[serde(rename = "Slightly Overvalued")]
    SlightlyOvervalued,
    Overvalued,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationStatus {
    pub status: ValuationBand,
    pub score: f64,
    pub factors: Vec<String>,
}

/// Combine the DCF margin and the sector-relative PE premium into a
/// single 0-100 cheap/expensive score, starting from a neutral 50.
pub fn valuation_status(
    current_price: f64,
    dcf_value: f64,
    pe_ratio: f64,
    sector_pe: f64,
) -> ValuationStatus {
    let mut score = 50.0;
    let mut factors = Vec::new();

    if dcf_value > 0.0 && current_price > 0.0 {
        let margin = (dcf_value - current_price) / current_price * 100.0;
        if margin > 30.0 {
            factors.push(format!("DCF shows {margin:.0}% upside"));
            score += 25.0;
        } else if margin > 10.0 {
            factors.push(format!("DCF shows {margin:.0}% upside"));
            score += 15.0;
        } else if margin < -30.0 {
            factors.push(format!("DCF shows {:.0}% downside", margin.abs()));
            score -= 25.0;
        } else if margin < -10.0 {
            factors.push(format!("DCF shows {:.0}% downside", margin.abs()));
            score -= 15.0;
        }
    }

    if pe_ratio > 0.0 && sector_pe > 0.0 {
        let premium = (pe_ratio - sector_pe) / sector_pe * 100.0;
        if premium < -30.0 {
            factors.push(format!("PE {premium:.0}% below sector avg"));
            score += 15.0;
        } else if premium < -10.0 {
            factors.push("PE slightly below sector avg".into());
            score += 8.0;
        } else if premium > 50.0 {
            factors.push(format!("PE {premium:.0}% above sector avg"));
            score -= 15.0;
        } else if premium > 20.0 {
            factors.push("PE above sector average".into());
            score -= 8.0;
        }
    }

    let status = if score >= 70.0 {
        ValuationBand::Undervalued
    } else if score >= 55.0 {
        ValuationBand::SlightlyUndervalued
    } else if score >= 45.0 {
        ValuationBand::FairValue
    } else if score >= 30.0 {
        ValuationBand::SlightlyOvervalued
    } else {
        ValuationBand::Overvalued
    };

    ValuationStatus {
        status,
        score,
        factors,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValuationResult {
    pub valuation: ValuationStatus,
    pub market_cap_category: MarketCapCategory,
    pub market_cap: f64,
    pub pe_score: f64,
    pub dcf: DcfValuation,
    pub hurdle: HurdleRate,
    pub targets: Option<TargetPrices>,
}

/// Run the full pipeline for one stock: hurdle rate from beta, growth
/// from ROE, DCF against the live price, PE score and status against
/// the sector benchmark, and ATR targets from the indicator frame.
pub fn evaluate(
    fundamentals: &Fundamentals,
    sector: &str,
    frame: &IndicatorFrame,
) -> ValuationResult {
    let price = fundamentals.price;
    let hurdle = hurdle_rate(fundamentals.beta);
    let growth = growth_from_roe(fundamentals.roe);
    let dcf = dcf_value(fundamentals.eps, growth, hurdle.rate_pct / 100.0).with_price(price);

    let atr = frame.latest().and_then(|row| row.atr);
    let high_52w = frame.high_52w().or(if fundamentals.high_52w > 0.0 {
        Some(fundamentals.high_52w)
    } else {
        None
    });
    let low_52w = frame.low_52w().or(if fundamentals.low_52w > 0.0 {
        Some(fundamentals.low_52w)
    } else {
        None
    });

    let benchmark = sector_pe(sector);
    let targets = target_prices(price, atr, high_52w, low_52w, Some(dcf.intrinsic_value));
    let valuation = valuation_status(price, dcf.intrinsic_value, fundamentals.pe_ratio, benchmark);

    ValuationResult {
        valuation,
        market_cap_category: market_cap_category(fundamentals.market_cap),
        market_cap: fundamentals.market_cap,
        pe_score: pe_score(fundamentals.pe_ratio, sector),
        dcf,
        hurdle,
        targets,
    }
}

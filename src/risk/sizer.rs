use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market::{AssetClass, AssetClassProfile, PriceSeries};
use crate::strategy::{LevelKind, Signal, SignalType};

use super::atr::average_true_range;

/// Concrete, risk-bounded sizing output for one trade. `position_size` is in
/// the class's native unit: whole shares for stocks, quote notional for
/// crypto, currency units (micro-lots) for forex. Zero is never returned;
/// a do-not-trade decision is `None` from [`RiskSizer::size`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskParameters {
    pub position_size: Decimal,
    pub stop_loss_price: Decimal,
    pub take_profit_price: Option<Decimal>,
    pub trailing_stop: bool,
    pub trailing_stop_distance: Option<Decimal>,
    pub max_drawdown: Option<Decimal>,
}

/// Turns a signal plus recent volatility into position size and stop/target
/// levels. Pure: `None` means "no trade this cycle", never an error.
pub struct RiskSizer {
    account_size: Decimal,
}

impl RiskSizer {
    pub fn new(account_size: Decimal) -> Self {
        if account_size <= Decimal::ZERO {
            tracing::warn!("account size {} is invalid, sizing will decline all trades", account_size);
        }
        Self { account_size }
    }

    pub fn size(
        &self,
        signal: &Signal,
        series: &PriceSeries,
        profile: &AssetClassProfile,
    ) -> Option<RiskParameters> {
        if series.is_empty() || self.account_size <= Decimal::ZERO {
            return None;
        }
        if signal.is_expired(Utc::now()) {
            tracing::debug!("signal {} for {} expired before sizing", signal.id, signal.symbol);
            return None;
        }
        let reference = signal.price;
        if reference <= Decimal::ZERO {
            return None;
        }

        let atr = average_true_range(&series.bars);
        let stop = self.place_stop(signal, profile, atr);
        let price_risk = (reference - stop).abs();
        if price_risk <= Decimal::ZERO {
            return None;
        }

        let risk_amount = self.account_size * profile.risk_per_trade;
        let raw_quantity = risk_amount / price_risk;
        let cap_notional = self.account_size * profile.max_position_fraction;

        let (position_size, notional) =
            to_native_unit(series.asset_class, raw_quantity, reference, cap_notional);
        if position_size <= Decimal::ZERO || notional < profile.min_order_notional {
            tracing::debug!(
                "{}: size {} (notional {}) below class minimum, skipping",
                signal.symbol,
                position_size,
                notional
            );
            return None;
        }

        let take_profit = match signal.signal_type {
            SignalType::EnterLong => reference + price_risk * profile.target_rr_ratio,
            SignalType::EnterShort => reference - price_risk * profile.target_rr_ratio,
        }
        .max(profile.min_price);

        Some(RiskParameters {
            position_size,
            stop_loss_price: stop.max(profile.min_price),
            take_profit_price: Some(take_profit),
            trailing_stop: true,
            trailing_stop_distance: Some(atr),
            max_drawdown: Some(profile.risk_per_trade * Decimal::from(5)),
        })
    }

    /// ATR-based stop, tightened toward a broken level when the signal names
    /// one, then pushed back out to the minimum stop distance floor.
    fn place_stop(&self, signal: &Signal, profile: &AssetClassProfile, atr: Decimal) -> Decimal {
        let reference = signal.price;
        let stop_distance = atr * profile.atr_stop_multiplier;
        let one_pct = Decimal::new(1, 2);
        let floor = reference * profile.min_stop_distance_fraction;

        match signal.signal_type {
            SignalType::EnterLong => {
                let mut stop = reference - stop_distance;
                if let (Some(level), Some(LevelKind::Resistance)) =
                    (signal.level_price(), signal.level_kind())
                {
                    stop = stop.max(level * (Decimal::ONE - one_pct));
                }
                if reference - stop < floor {
                    stop = reference - floor;
                }
                stop
            }
            SignalType::EnterShort => {
                let mut stop = reference + stop_distance;
                if let (Some(level), Some(LevelKind::Support)) =
                    (signal.level_price(), signal.level_kind())
                {
                    stop = stop.min(level * (Decimal::ONE + one_pct));
                }
                if stop - reference < floor {
                    stop = reference + floor;
                }
                stop
            }
        }
    }
}

/// Convert a raw risk-derived quantity into the class's tradable unit,
/// capped at `cap_notional` of account equity.
fn to_native_unit(
    class: AssetClass,
    raw_quantity: Decimal,
    price: Decimal,
    cap_notional: Decimal,
) -> (Decimal, Decimal) {
    match class {
        AssetClass::Stock => {
            let max_shares = (cap_notional / price).floor();
            let shares = raw_quantity.floor().min(max_shares);
            (shares, shares * price)
        }
        AssetClass::Crypto => {
            let notional = (raw_quantity * price).min(cap_notional).round_dp(8);
            (notional, notional)
        }
        AssetClass::Forex => {
            let units = raw_quantity.min(cap_notional / price);
            let micro_lots = (units / Decimal::ONE_THOUSAND).round() * Decimal::ONE_THOUSAND;
            (micro_lots, micro_lots * price)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::PriceBar;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn series(class: AssetClass, high: Decimal, low: Decimal, close: Decimal) -> PriceSeries {
        let bars = vec![PriceBar::new(Utc::now(), close, high, low, close, 1000.0)];
        PriceSeries::new("TEST", "1d", class, bars)
    }

    fn long_signal(price: Decimal) -> Signal {
        Signal::new("TEST", SignalType::EnterLong, price, 0.8, Duration::minutes(60))
    }

    #[test]
    fn test_stock_sizing_scenario() {
        // ATR fallback = 4, stop = 100 - 6 = 94, risk amount = 100.
        // Raw 16 shares, capped at 1000 notional -> 10 shares.
        let series = series(AssetClass::Stock, dec!(102), dec!(98), dec!(100));
        let profile = AssetClass::Stock.profile();
        let sizer = RiskSizer::new(dec!(10000));

        let params = sizer
            .size(&long_signal(dec!(100)), &series, &profile)
            .expect("trade should be sized");

        assert_eq!(params.position_size, dec!(10));
        assert_eq!(params.stop_loss_price, dec!(94));
        assert_eq!(params.take_profit_price, Some(dec!(112)));
        assert!(params.trailing_stop);
        assert_eq!(params.trailing_stop_distance, Some(dec!(4)));
        assert_eq!(params.max_drawdown, Some(dec!(0.05)));
    }

    #[test]
    fn test_long_invariants() {
        let series = series(AssetClass::Stock, dec!(102), dec!(98), dec!(100));
        let profile = AssetClass::Stock.profile();
        let params = RiskSizer::new(dec!(10000))
            .size(&long_signal(dec!(100)), &series, &profile)
            .unwrap();

        assert!(params.stop_loss_price < dec!(100));
        assert!(params.take_profit_price.unwrap() > dec!(100));
        assert!(params.position_size > Decimal::ZERO);
    }

    #[test]
    fn test_short_invariants() {
        let series = series(AssetClass::Stock, dec!(102), dec!(98), dec!(100));
        let profile = AssetClass::Stock.profile();
        let signal = Signal::new("TEST", SignalType::EnterShort, dec!(100), 0.8, Duration::minutes(60));
        let params = RiskSizer::new(dec!(10000))
            .size(&signal, &series, &profile)
            .unwrap();

        assert!(params.stop_loss_price > dec!(100));
        assert!(params.take_profit_price.unwrap() < dec!(100));
    }

    #[test]
    fn test_breakout_level_tightens_long_stop() {
        let series = series(AssetClass::Stock, dec!(102), dec!(98), dec!(100));
        let profile = AssetClass::Stock.profile();
        let signal = long_signal(dec!(100))
            .with_metadata("level_price", json!(dec!(99)))
            .with_metadata("level_type", json!(LevelKind::Resistance));

        let params = RiskSizer::new(dec!(10000))
            .size(&signal, &series, &profile)
            .unwrap();

        // 99 * 0.99 = 98.01 is tighter than the ATR stop at 94
        assert_eq!(params.stop_loss_price, dec!(98.01));
    }

    #[test]
    fn test_min_stop_distance_floor() {
        // Level stop would land 0.099% from the reference; the stock floor
        // is 0.5%, so the stop is pushed out to 99.5.
        let series = series(AssetClass::Stock, dec!(102), dec!(98), dec!(100));
        let profile = AssetClass::Stock.profile();
        let signal = long_signal(dec!(100))
            .with_metadata("level_price", json!(dec!(100.9)))
            .with_metadata("level_type", json!(LevelKind::Resistance));

        let params = RiskSizer::new(dec!(10000))
            .size(&signal, &series, &profile)
            .unwrap();
        assert_eq!(params.stop_loss_price, dec!(99.5));
    }

    #[test]
    fn test_below_minimum_notional_declines() {
        // 50-dollar account: stock cap is 5 notional, under the 100 minimum
        let series = series(AssetClass::Stock, dec!(102), dec!(98), dec!(100));
        let profile = AssetClass::Stock.profile();
        let params = RiskSizer::new(dec!(50)).size(&long_signal(dec!(100)), &series, &profile);
        assert!(params.is_none());
    }

    #[test]
    fn test_expired_signal_declines() {
        let series = series(AssetClass::Stock, dec!(102), dec!(98), dec!(100));
        let profile = AssetClass::Stock.profile();
        let mut signal = long_signal(dec!(100));
        signal.expiration = signal.created_at - Duration::minutes(1);
        assert!(RiskSizer::new(dec!(10000)).size(&signal, &series, &profile).is_none());
    }

    #[test]
    fn test_empty_series_declines() {
        let empty = PriceSeries::new("TEST", "1d", AssetClass::Stock, Vec::new());
        let profile = AssetClass::Stock.profile();
        assert!(RiskSizer::new(dec!(10000))
            .size(&long_signal(dec!(100)), &empty, &profile)
            .is_none());
    }

    #[test]
    fn test_crypto_size_is_fractional_notional() {
        let series = series(AssetClass::Crypto, dec!(30300), dec!(29700), dec!(30000));
        let profile = AssetClass::Crypto.profile();
        let params = RiskSizer::new(dec!(10000))
            .size(
                &Signal::new("BTC-USD", SignalType::EnterLong, dec!(30000), 0.8, Duration::minutes(60)),
                &series,
                &profile,
            )
            .unwrap();

        // ATR fallback 600, stop distance 1200, risk 200 -> qty 1/6 BTC,
        // notional 5000 > cap 1500
        assert_eq!(params.position_size, dec!(1500));
        assert_eq!(params.stop_loss_price, dec!(28800));
    }

    #[test]
    fn test_forex_size_rounds_to_micro_lots() {
        let series = series(AssetClass::Forex, dec!(1.1010), dec!(1.0990), dec!(1.1000));
        let profile = AssetClass::Forex.profile();
        let params = RiskSizer::new(dec!(100000))
            .size(
                &Signal::new("EURUSD", SignalType::EnterLong, dec!(1.1000), 0.8, Duration::minutes(60)),
                &series,
                &profile,
            )
            .unwrap();

        assert_eq!(params.position_size % Decimal::ONE_THOUSAND, Decimal::ZERO);
        assert!(params.position_size > Decimal::ZERO);
    }
}

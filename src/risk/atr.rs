use rust_decimal::Decimal;

use crate::market::PriceBar;

pub const ATR_PERIOD: usize = 14;

/// ATR(14) over the most recent bars. With fewer than 14 bars the current
/// bar's range stands in, so a thin series still produces a usable stop
/// distance.
pub fn average_true_range(bars: &[PriceBar]) -> Decimal {
    let Some(last) = bars.last() else {
        return Decimal::ZERO;
    };
    if bars.len() < ATR_PERIOD {
        return last.high - last.low;
    }

    let window = &bars[bars.len() - ATR_PERIOD..];
    let mut sum = Decimal::ZERO;
    for (i, bar) in window.iter().enumerate() {
        let range = bar.high - bar.low;
        let tr = if i == 0 {
            range
        } else {
            let prev_close = window[i - 1].close;
            range
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        };
        sum += tr;
    }
    sum / Decimal::from(ATR_PERIOD as u64)
}

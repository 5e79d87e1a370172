//! Incremental OHLC aggregation.
//!
//! Two paths feed the same bar sequence: [`TickAggregator::merge_history`]
//! folds a batch of historical candles into a fresh sequence, and
//! [`TickAggregator::merge_live`] applies one streamed quote to an existing
//! sequence. Both decide bar membership through a [`BucketStrategy`].
//!
//! The default strategy, [`BucketStrategy::MinuteOfHour`], keys bars on the
//! minute-of-hour of the epoch regardless of the configured granularity. It
//! is only correct for one-minute bars: two quotes exactly an hour apart land
//! in the same bar, and day boundaries are ignored. [`BucketStrategy::Aligned`]
//! floors the epoch to the granularity window and has to be opted into.

use tracing::debug;

use crate::models::Bar;
use crate::models::candle::{CandleData, Granularity, TickHistory};

/// How a quote's epoch is turned into the key that decides bar membership.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BucketStrategy {
    /// Minute-of-hour (0 to 59) in UTC.
    #[default]
    MinuteOfHour,
    /// `floor(epoch / granularity) * granularity`.
    Aligned,
}

impl BucketStrategy {
    /// Computes the bucket key of `epoch`.
    ///
    /// Raw-tick granularity has no window, so [`BucketStrategy::Aligned`]
    /// keys every epoch separately.
    #[must_use]
    pub fn key(&self, epoch: i64, granularity: Granularity) -> i64 {
        match self {
            BucketStrategy::MinuteOfHour => epoch.div_euclid(60).rem_euclid(60),
            BucketStrategy::Aligned => match granularity.seconds() {
                Some(width) if width > 0 => {
                    let width = i64::from(width);
                    epoch.div_euclid(width) * width
                }
                _ => epoch,
            },
        }
    }
}

/// What [`TickAggregator::merge_live`] did with a quote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveMerge {
    /// The sequence was empty and now holds only this quote.
    Seeded,
    /// The quote was folded into the last bar.
    Merged,
    /// The quote opened a new bar.
    Appended,
    /// The quote predates the last bar and was dropped.
    Stale,
}

/// Stateless bar builder for one granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickAggregator {
    pub granularity: Granularity,
    pub strategy: BucketStrategy,
}

impl TickAggregator {
    #[must_use]
    pub fn new(granularity: Granularity, strategy: BucketStrategy) -> Self {
        Self {
            granularity,
            strategy,
        }
    }

    fn key(&self, epoch: i64) -> i64 {
        self.strategy.key(epoch, self.granularity)
    }

    /// Folds consecutive candles sharing a bucket key into single bars.
    ///
    /// `candles` must be ordered by non-decreasing epoch; the output keeps
    /// that order and never holds two adjacent bars with the same key.
    #[must_use]
    pub fn merge_history(&self, candles: &[CandleData]) -> Vec<Bar> {
        let mut bars = Vec::new();
        let mut open: Option<(i64, Bar)> = None;

        for candle in candles {
            let key = self.key(candle.epoch);
            let incoming = Bar::from(candle);

            match open.as_mut() {
                Some((current_key, bar)) if *current_key == key => bar.absorb(&incoming),
                _ => {
                    if let Some((_, finished)) = open.replace((key, incoming)) {
                        bars.push(finished);
                    }
                }
            }
        }

        if let Some((_, last)) = open {
            bars.push(last);
        }

        debug!(
            candles = candles.len(),
            bars = bars.len(),
            "Merged historical candles"
        );
        bars
    }

    /// Applies one live quote to `bars`.
    ///
    /// Quotes in the last bar's bucket are merged into it; anything else
    /// opens a new bar, leaving earlier bars untouched. In raw-tick mode every
    /// quote is its own point.
    pub fn merge_live(&self, bars: &mut Vec<Bar>, quote: Bar) -> LiveMerge {
        let Some(last) = bars.last_mut() else {
            bars.push(quote);
            return LiveMerge::Seeded;
        };

        if quote.epoch < last.epoch {
            debug!(
                epoch = quote.epoch,
                last_epoch = last.epoch,
                "Dropping out-of-order quote"
            );
            return LiveMerge::Stale;
        }

        if self.granularity != Granularity::Ticks && self.key(quote.epoch) == self.key(last.epoch)
        {
            last.absorb(&quote);
            LiveMerge::Merged
        } else {
            bars.push(quote);
            LiveMerge::Appended
        }
    }

    /// Turns a raw tick history into line points.
    ///
    /// The parallel `prices`/`times` arrays are zipped; a trailing element
    /// without a partner is ignored.
    #[must_use]
    pub fn points_from_history(history: &TickHistory) -> Vec<Bar> {
        history
            .times
            .iter()
            .zip(&history.prices)
            .map(|(&epoch, &price)| Bar::point(epoch, price))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn candle(
        epoch: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> CandleData {
        CandleData {
            epoch,
            open,
            high,
            low,
            close,
        }
    }

    fn flat(epoch: i64, price: Decimal) -> CandleData {
        candle(epoch, price, price, price, price)
    }

    fn minute_aggregator() -> TickAggregator {
        TickAggregator::new(Granularity::MINUTE, BucketStrategy::MinuteOfHour)
    }

    #[test]
    fn minute_of_hour_key() {
        let strategy = BucketStrategy::MinuteOfHour;
        assert_eq!(strategy.key(0, Granularity::MINUTE), 0);
        assert_eq!(strategy.key(59, Granularity::MINUTE), 0);
        assert_eq!(strategy.key(60, Granularity::MINUTE), 1);
        assert_eq!(strategy.key(3_600 + 5 * 60, Granularity::HOUR), 5);
    }

    #[test]
    fn aligned_key_floors_to_window() {
        let strategy = BucketStrategy::Aligned;
        assert_eq!(strategy.key(3_599, Granularity::HOUR), 0);
        assert_eq!(strategy.key(3_600, Granularity::HOUR), 3_600);
        assert_eq!(strategy.key(90_000, Granularity::DAY), 86_400);
        assert_eq!(strategy.key(42, Granularity::Ticks), 42);
    }

    #[test]
    fn merges_same_bucket_candles() {
        let candles = [
            candle(0, dec!(10), dec!(12), dec!(9), dec!(11)),
            candle(30, dec!(11), dec!(14), dec!(8), dec!(13)),
        ];

        let bars = minute_aggregator().merge_history(&candles);

        assert_eq!(bars, vec![Bar::ohlc(0, dec!(10), dec!(14), dec!(8), dec!(13))]);
    }

    #[test]
    fn history_splits_on_minute_change() {
        let candles = [flat(0, dec!(1)), flat(30, dec!(2)), flat(90, dec!(3))];

        let bars = minute_aggregator().merge_history(&candles);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].epoch, 0);
        assert_eq!(bars[0].close, Some(dec!(2)));
        assert_eq!(bars[1].epoch, 90);
        assert_eq!(bars[1].close, Some(dec!(3)));
    }

    #[test]
    fn minute_of_hour_merges_candles_an_hour_apart() {
        let candles = [flat(5 * 60, dec!(1)), flat(5 * 60 + 3_600, dec!(7))];

        let bars = TickAggregator::new(Granularity::HOUR, BucketStrategy::MinuteOfHour)
            .merge_history(&candles);

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].high, Some(dec!(7)));
        assert_eq!(bars[0].close, Some(dec!(7)));
    }

    #[test]
    fn aligned_keeps_hour_buckets_apart() {
        let candles = [
            flat(5 * 60, dec!(1)),
            flat(40 * 60, dec!(2)),
            flat(5 * 60 + 3_600, dec!(7)),
        ];

        let bars =
            TickAggregator::new(Granularity::HOUR, BucketStrategy::Aligned).merge_history(&candles);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, Some(dec!(2)));
        assert_eq!(bars[1].epoch, 5 * 60 + 3_600);
    }

    #[test]
    fn empty_history_yields_no_bars() {
        assert!(minute_aggregator().merge_history(&[]).is_empty());
    }

    #[test]
    fn live_append_or_merge() {
        let aggregator = minute_aggregator();
        let mut bars = Vec::new();

        let first = Bar::ohlc(10 * 60, dec!(5), dec!(6), dec!(4), dec!(5.5));
        let second = Bar::ohlc(10 * 60 + 20, dec!(5.5), dec!(7), dec!(5), dec!(6.5));
        let third = Bar::ohlc(11 * 60, dec!(6.5), dec!(6.6), dec!(6.4), dec!(6.5));

        assert_eq!(aggregator.merge_live(&mut bars, first), LiveMerge::Seeded);
        assert_eq!(aggregator.merge_live(&mut bars, second), LiveMerge::Merged);
        assert_eq!(
            aggregator.merge_live(&mut bars, third.clone()),
            LiveMerge::Appended
        );

        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0],
            Bar::ohlc(10 * 60, dec!(5), dec!(7), dec!(4), dec!(6.5))
        );
        assert_eq!(bars[1], third);
    }

    #[test]
    fn live_append_leaves_prior_bars_untouched() {
        let aggregator = minute_aggregator();
        let mut bars = vec![
            Bar::ohlc(0, dec!(1), dec!(2), dec!(0.5), dec!(1.5)),
            Bar::ohlc(60, dec!(1.5), dec!(3), dec!(1), dec!(2)),
        ];
        let before = bars[0].clone();

        aggregator.merge_live(&mut bars, Bar::ohlc(120, dec!(2), dec!(9), dec!(0), dec!(8)));

        assert_eq!(bars[0], before);
        assert_eq!(bars.len(), 3);
    }

    #[test]
    fn live_drops_out_of_order_quote() {
        let aggregator = minute_aggregator();
        let mut bars = vec![Bar::ohlc(120, dec!(1), dec!(1), dec!(1), dec!(1))];

        let quote = Bar::ohlc(30, dec!(9), dec!(9), dec!(9), dec!(9));
        let outcome = aggregator.merge_live(&mut bars, quote);

        assert_eq!(outcome, LiveMerge::Stale);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, Some(dec!(1)));
    }

    #[test]
    fn tick_mode_appends_every_quote() {
        let aggregator = TickAggregator::new(Granularity::Ticks, BucketStrategy::MinuteOfHour);
        let mut bars = Vec::new();

        aggregator.merge_live(&mut bars, Bar::point(1, dec!(100)));
        aggregator.merge_live(&mut bars, Bar::point(2, dec!(101)));

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, Some(dec!(101)));
    }

    #[test]
    fn points_from_history_zips_parallel_arrays() {
        let history = TickHistory {
            prices: vec![dec!(1.1), dec!(1.2), dec!(1.3)],
            times: vec![10, 11],
        };

        let points = TickAggregator::points_from_history(&history);

        assert_eq!(points, vec![Bar::point(10, dec!(1.1)), Bar::point(11, dec!(1.2))]);
    }
}

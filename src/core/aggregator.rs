use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::{BestPick, ResultMap};

/// Picks the cheapest found result.
///
/// Only results with `found = true` and a price that parses as a
/// non-negative decimal are candidates. Ties go to the app listed first in
/// priority order, which is the map's iteration order.
pub struct BestPriceAggregator;

impl BestPriceAggregator {
    pub fn aggregate(results: &ResultMap) -> Option<BestPick> {
        let mut best: Option<(Decimal, BestPick)> = None;

        for (app, result) in results {
            if !result.found {
                continue;
            }
            let Some(price) = result.price.as_deref() else {
                continue;
            };
            let Ok(amount) = Decimal::from_str(&price.replace(',', "")) else {
                continue;
            };
            if amount.is_sign_negative() {
                continue;
            }

            let better = match &best {
                Some((current, _)) => amount < *current,
                None => true,
            };
            if better {
                best = Some((
                    amount,
                    BestPick {
                        app: *app,
                        price: price.to_string(),
                    },
                ));
            }
        }

        best.map(|(_, pick)| pick)
    }
}

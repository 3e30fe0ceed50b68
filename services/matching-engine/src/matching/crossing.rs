//! Price-compatibility checks between an incoming order and a resting level.

use types::numeric::Price;
use types::order::Side;

/// Does an incoming order at `limit` cross a resting level at `resting`?
///
/// A buy crosses any ask at or below its limit; a sell crosses any bid at
/// or above its limit. Equality matches: the taker trades at the resting
/// price and never worse than its own limit.
pub fn taker_crosses(taker_side: Side, limit: Price, resting: Price) -> bool {
    match taker_side {
        Side::Buy => limit >= resting,
        Side::Sell => limit <= resting,
    }
}

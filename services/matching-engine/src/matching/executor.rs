//! Trade construction with per-book sequence stamping.

use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::Side;
use types::trade::Trade;

/// Stamps each fill with a monotonically increasing sequence number.
///
/// Lives inside the book's write lock, so sequence order equals the order
/// in which trades executed.
#[derive(Debug)]
pub struct MatchExecutor {
    sequence: u64,
}

impl MatchExecutor {
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            sequence: starting_sequence,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }

    /// Record one fill at the maker's resting price.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &mut self,
        symbol: &Symbol,
        maker_order_id: OrderId,
        taker_order_id: OrderId,
        maker: String,
        taker_side: Side,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Trade {
        Trade::new(
            self.next_sequence(),
            symbol.clone(),
            maker_order_id,
            taker_order_id,
            maker,
            taker_side,
            price,
            quantity,
            executed_at,
        )
    }
}

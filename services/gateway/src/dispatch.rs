//! Request dispatcher: decode → risk check → book → settle → respond.
//!
//! Every failure is recovered here and turned into a structured response;
//! the connection survives everything except its own I/O errors. The path
//! of one order takes the session lock, then the book lock, never the
//! reverse, and never holds the session lock across a book call.

use crate::registry::SessionRegistry;
use market_data::{SnapshotEmitter, TopOfBook};
use matching_engine::OrderBook;
use protocol::{binary, JoinRequest, NewOrderRequest, Request, Response};
use std::sync::Arc;
use types::errors::RequestError;
use types::ids::{ConnectionId, OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::Order;

pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    emitter: Option<Arc<SnapshotEmitter>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            emitter: None,
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<SnapshotEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Handle one decoded request; never fails, errors become responses.
    pub fn process(&self, connection: ConnectionId, request: &Request) -> Response {
        let result = match request {
            Request::Join(join) => self.handle_join(connection, join),
            Request::NewOrder(order) => self.handle_new_order(connection, order),
        };
        result.unwrap_or_else(|err| {
            tracing::debug!(%connection, %err, "request rejected");
            Response::error(err.to_string())
        })
    }

    /// Per-connection teardown after the peer goes away.
    pub fn disconnect(&self, connection: ConnectionId) {
        self.registry.remove_connection(connection);
    }

    fn handle_join(
        &self,
        connection: ConnectionId,
        join: &JoinRequest,
    ) -> Result<Response, RequestError> {
        let session = self.registry.get(&join.session_id)?;
        session.add_user(&join.username, connection)?;
        tracing::info!(session = %join.session_id, username = %join.username, %connection, "user joined");
        Ok(Response::success("Joined session")
            .with_session(join.session_id.clone(), join.username.clone()))
    }

    fn handle_new_order(
        &self,
        connection: ConnectionId,
        request: &NewOrderRequest,
    ) -> Result<Response, RequestError> {
        // Resolution failures outrank validation failures: the session and
        // book are looked up before the order fields are inspected.
        let session = self.registry.get(&request.session_id)?;
        let book = session.book(&request.symbol)?;

        let price = Price::from_f64(request.price)
            .ok_or_else(|| RequestError::InvalidOrder(format!("bad price {}", request.price)))?;
        let quantity = Quantity::new(request.quantity);
        let order = Order::try_new(request.order_id, request.side, price, quantity)
            .ok_or_else(|| RequestError::InvalidOrder("zero quantity".to_string()))?;

        let username =
            session.pre_trade_check(connection, order.side, price, quantity, &request.symbol)?;

        let pool = self.registry.pool();
        let handle = pool
            .acquire(order)
            .map_err(|_| RequestError::PoolExhausted)?;

        let response = match book.match_order(&order) {
            Some(outcome) => {
                for trade in &outcome.trades {
                    session.settle_trade(&username, trade);
                }
                tracing::debug!(
                    order_id = %order.id,
                    fills = outcome.trades.len(),
                    remaining = %outcome.remaining,
                    "order matched"
                );
                pool.release(handle);
                Response::success("Order matched").with_order_id(order.id)
            }
            None => {
                book.add_order(&order, &username, handle);
                Response::success("Order added to book").with_order_id(order.id)
            }
        };

        self.publish_top(&request.symbol, &book);
        Ok(response)
    }

    fn publish_top(&self, symbol: &Symbol, book: &OrderBook) {
        if let Some(emitter) = &self.emitter {
            let top = book.top_of_book();
            emitter.publish(&TopOfBook {
                symbol: symbol.clone(),
                bid: top.bid,
                ask: top.ask,
            });
        }
    }
}

/// Render a response in the binary format.
///
/// A successful join echoes the JOIN frame, everything else is an
/// ORDER_ACK; error acks carry order id 0, as on the original wire.
pub fn encode_binary_response(response: &Response, seq_num: u32) -> Vec<u8> {
    if response.is_success() {
        if let (Some(session_id), Some(username)) = (&response.session_id, &response.username) {
            return binary::encode_join(username, session_id, seq_num);
        }
    }
    binary::encode_order_ack(
        response.order_id.unwrap_or(OrderId::new(0)),
        response.is_success(),
        &response.message,
        seq_num,
    )
}

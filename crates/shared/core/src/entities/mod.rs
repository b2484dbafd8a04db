mod execution;
mod locate;
mod order;
mod order_status;
mod order_type;
mod position;
mod rejection;
mod side;

pub use execution::Execution;
pub use locate::{LocateOrder, LocateResponse};
pub use order::{CancelOrder, Order, OrderId};
pub use order_status::OrderStatus;
pub use order_type::OrderType;
pub use position::Position;
pub use rejection::{Rejection, RejectionKind};
pub use side::Side;

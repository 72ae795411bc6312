pub mod commerce;
pub mod order;
pub mod order_item;
pub mod order_status_history;
pub mod payment;

pub use order::{Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use order_status_history::{Entity as OrderStatusHistory, Model as OrderStatusHistoryModel};
pub use payment::{Entity as Payment, Model as PaymentModel, PaymentStatus};

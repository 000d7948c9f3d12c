// Domain entities decoded from upstream responses.
//
// Entities are transient: the client hands them out and keeps nothing.

pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod reference;

pub use category::Category;
pub use customer::Customer;
pub use order::{Order, OrderDetail};
pub use product::{NewProduct, Product, ProductImage, ProductVariant};
pub use reference::{CargoCompany, OrderStatus, PaymentType, Reference};

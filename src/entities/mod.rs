pub mod attribute_set;
pub mod customer;
pub mod employee;
pub mod inventory_batch;
pub mod inventory_item;
pub mod inventory_variant;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod order_payment;
pub mod product_category;
pub mod promotion;
pub mod supplier;
pub mod user;
pub mod variant_attribute;
pub mod warranty;

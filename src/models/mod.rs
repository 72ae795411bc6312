//! Value types shared by entities and services.

pub mod address;
pub mod attributes;

pub use address::ShippingAddress;
pub use attributes::{
    AttributeBag, AttributeDefinition, AttributeKind, AttributePair, AttributeSchema,
    AttributeSet, ImageUrls, ProductSpecs,
};

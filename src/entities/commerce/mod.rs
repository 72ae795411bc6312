/// Catalog, cart and review entities
pub mod attribute_image;
pub mod brand;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod customer_address;
pub mod inventory_level;
pub mod product;
pub mod product_variant;
pub mod review;
pub mod variant_attribute;

// Re-export entities
pub use attribute_image::{Entity as AttributeImage, Model as AttributeImageModel};
pub use brand::{Entity as Brand, Model as BrandModel};
pub use cart::{CartStatus, Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{CategoryStatus, Entity as Category, Model as CategoryModel};
pub use customer_address::{Entity as CustomerAddress, Model as CustomerAddressModel};
pub use inventory_level::{Entity as InventoryLevel, Model as InventoryLevelModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_variant::{Entity as ProductVariant, Model as ProductVariantModel, VariantStatus};
pub use review::{Entity as Review, Model as ReviewModel, ReviewStatus};
pub use variant_attribute::{Entity as VariantAttribute, Model as VariantAttributeModel};

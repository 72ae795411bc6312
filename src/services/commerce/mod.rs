/// Catalog, cart, checkout and review services
pub mod address_service;
pub mod brand_service;
pub mod cart_service;
pub mod catalog_query;
pub mod category_service;
pub mod image_resolver;
pub mod order_service;
pub mod product_catalog_service;
pub mod review_service;
pub mod variant_generator;

// Re-export services for convenience
pub use address_service::{AddressInput, AddressService};
pub use brand_service::{BrandInput, BrandService};
pub use cart_service::{AddItemInput, CartLine, CartService, CartView, MAX_LINE_QUANTITY};
pub use catalog_query::{AttributeMatch, Pagination, ProductFilters};
pub use category_service::{CategoryInput, CategoryService, CategorySummary};
pub use order_service::{
    OrderDetail, OrderService, OrderSummary, PlaceOrderInput, ShippingChoice,
    UpdateOrderStatusInput,
};
pub use product_catalog_service::{
    AttributeImageInput, AttributeImageView, PreviewVariantsInput, ProductCatalogService,
    ProductDetail, ProductInput, ProductListItem, ProductPage, VariantInput, VariantView,
};
pub use review_service::{ReviewInput, ReviewService};
pub use variant_generator::{OptionSelections, VariantDraft};

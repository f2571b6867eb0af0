mod kronecker_product;
pub use kronecker_product::kronecker_product;

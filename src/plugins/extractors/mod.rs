// Transcript extractors
pub mod label;
pub mod price;

pub use label::ProductLabelExtractor;
pub use price::{PriceExtractor, PriceMatcher};

pub mod quote;
pub mod symbol;
pub mod timestamp;

pub use quote::{validate_currency_code, PriceQuote, PriceSource, QuoteLog};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;

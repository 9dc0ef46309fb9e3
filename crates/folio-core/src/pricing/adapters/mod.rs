pub mod alphavantage;
pub mod yahoo;

pub use alphavantage::AlphaVantageSource;
pub use yahoo::YahooSource;

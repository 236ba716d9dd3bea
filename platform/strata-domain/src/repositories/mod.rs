pub mod market_data;
pub mod results;

pub mod candle;
pub mod params;
pub mod position;
pub mod trade;

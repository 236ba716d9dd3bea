use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

/// Transient state of one open position. Owned exclusively by a single
/// in-flight simulation run; at most one is open per run at any time.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub entry_index: usize,
    pub entry_price: Decimal,
    pub side: Side,
}

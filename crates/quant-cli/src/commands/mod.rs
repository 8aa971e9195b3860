//! CLI 서브커맨드 구현.

pub mod backtest;
pub mod fetch;
pub mod kdj;
pub mod trade;

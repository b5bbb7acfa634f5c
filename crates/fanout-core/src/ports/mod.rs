//! Ports - 抽象化レイヤー
//!
//! プールが外部から受け取るものは処理関数だけなので、ポートは `Processor` ひとつ。

pub mod processor;

pub use self::processor::Processor;

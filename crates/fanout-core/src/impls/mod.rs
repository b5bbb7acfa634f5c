//! Impls - Processor の実装
//!
//! # 含まれる実装
//! - **Doubler**: 待ってから 2 倍（基準の処理）
//! - **Divider**: 整数除算
//! - **FnProcessor**: クロージャのアダプタ
//! - **NonNegative**: 負の入力を `NegativeValue` で弾くラッパー

pub mod divider;
pub mod doubler;
pub mod fn_processor;
pub mod non_negative;

pub use self::divider::Divider;
pub use self::doubler::Doubler;
pub use self::fn_processor::{FnProcessor, from_fn};
pub use self::non_negative::NonNegative;

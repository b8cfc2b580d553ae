//! 스캐너 도메인 모델.

pub mod candle;
pub mod features;
pub mod score;

pub use candle::*;
pub use features::*;
pub use score::*;

#[cfg(not(target_endian = "little"))]
compile_error!("kkc-core requires a little-endian platform");

pub mod converter;
pub mod dict;
pub mod expr;
pub mod kana;
pub mod lm;
pub mod settings;
pub mod user_history;

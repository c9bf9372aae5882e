/// Две консольные программы поверх общих конвейеров

pub mod coin_predict;
pub mod spam_filter;

//! Configuration access port.
//!
//! Lookups never fail: a missing or unparsable value yields `None` or the
//! supplied default. Strict checks live in `domain::config_validation`.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
}

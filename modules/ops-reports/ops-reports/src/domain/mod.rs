pub mod aggregate;
pub mod enrich;
pub mod error;
pub mod issues;
pub mod numeric;
pub mod pagination;
pub mod ports;
pub mod rank;
pub mod service;
pub mod timefmt;

#[cfg(test)]
pub(crate) mod testing;

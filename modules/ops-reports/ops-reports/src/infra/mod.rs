pub mod http_fetcher;
pub mod spreadsheet;

pub mod csv_file;
pub mod yahoo;

pub use csv_file::CsvFile;
pub use yahoo::YahooFinance;

/// Загрузка данных и табличное представление

pub mod loader;
pub mod market_chart;
pub mod table;

pub use loader::{load_records, load_table, write_records, CsvOptions};
pub use market_chart::MarketChart;
pub use table::{Column, ColumnType, DataTable, Record, Schema, Value};

//! Загрузка и запись CSV по фиксированной схеме

use std::fs::File;
use std::path::Path;

use crate::data::table::{Column, ColumnType, DataTable, Record, Schema, Value};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: false,
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Читает файл в таблицу. Любая ошибочная строка прерывает загрузку.
pub fn load_table(path: &Path, schema: &Schema, options: CsvOptions) -> Result<DataTable> {
    let reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .flexible(true)
        .from_reader(open(path)?);

    let table = read_table(reader, schema)?;
    tracing::debug!("Loaded {} rows from {}", table.n_rows(), path.display());
    Ok(table)
}

fn read_table<R: std::io::Read>(mut reader: csv::Reader<R>, schema: &Schema) -> Result<DataTable> {
    let mut columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|(_, ty)| Column::empty(*ty))
        .collect();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != schema.len() {
            return Err(PipelineError::FieldCount {
                line,
                expected: schema.len(),
                found: record.len(),
            });
        }

        for ((field, (name, ty)), column) in record
            .iter()
            .zip(schema.fields())
            .zip(columns.iter_mut())
        {
            let parse_error = || PipelineError::Parse {
                line,
                column: name.clone(),
                value: field.to_string(),
                expected: *ty,
            };

            match column {
                Column::Text(v) => v.push(field.to_string()),
                Column::Float(v) => v.push(parse_float(field).ok_or_else(parse_error)?),
                Column::Bool(v) => v.push(parse_bool(field).ok_or_else(parse_error)?),
                Column::Vector(_) => unreachable!("schema columns are scalar"),
            }
        }
    }

    let mut table = DataTable::new();
    for ((name, _), column) in schema.fields().iter().zip(columns) {
        table.insert(name.clone(), column)?;
    }
    Ok(table)
}

pub fn parse_float(field: &str) -> Option<f32> {
    field.trim().parse::<f32>().ok()
}

pub fn parse_bool(field: &str) -> Option<bool> {
    match field.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Загрузка типизированных записей
pub fn load_records<T: Record>(path: &Path, options: CsvOptions) -> Result<Vec<T>> {
    load_table(path, &T::schema(), options)?.to_records()
}

/// Запись в том же формате, который читает `load_table` (без заголовка)
pub fn write_records<T: Record>(path: &Path, records: &[T], options: CsvOptions) -> Result<()> {
    let file = File::create(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(file);

    if options.has_header {
        writer.write_record(T::schema().fields().iter().map(|(name, _)| name.as_str()))?;
    }

    for record in records {
        let fields: Vec<String> = record
            .values()
            .into_iter()
            .map(|value| match value {
                Value::Text(s) => s,
                Value::Float(x) => x.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Vector(v) => v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(" "),
            })
            .collect();
        writer.write_record(&fields)?;
    }

    writer.flush().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Используется для схемы, заданной вручную, без типизированных записей
pub fn schema_of(fields: &[(&str, ColumnType)]) -> Schema {
    Schema::new(fields.iter().map(|(name, ty)| (*name, *ty)))
}

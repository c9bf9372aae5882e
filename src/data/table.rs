//! Табличное представление данных в памяти

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Float32,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Float32 => "float32",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Схема записи: упорядоченный список (имя, тип), позиция = номер поля в CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<(String, ColumnType)>,
}

impl Schema {
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = (S, ColumnType)>) -> Self {
        Self {
            fields: fields.into_iter().map(|(name, ty)| (name.into(), ty)).collect(),
        }
    }

    pub fn fields(&self) -> &[(String, ColumnType)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Одно значение поля
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Float(f32),
    Bool(bool),
    Vector(Array1<f32>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Float(Vec<f32>),
    Bool(Vec<bool>),
    /// Векторная колонка: одна строка матрицы на запись
    Vector(Array2<f32>),
}

impl Column {
    pub fn empty(ty: ColumnType) -> Self {
        match ty {
            ColumnType::Text => Column::Text(Vec::new()),
            ColumnType::Float32 => Column::Float(Vec::new()),
            ColumnType::Boolean => Column::Bool(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Vector(m) => m.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Column::Text(_) => "text",
            Column::Float(_) => "float32",
            Column::Bool(_) => "boolean",
            Column::Vector(_) => "vector",
        }
    }

    pub fn value(&self, row: usize) -> Option<Value> {
        if row >= self.len() {
            return None;
        }
        Some(match self {
            Column::Text(v) => Value::Text(v[row].clone()),
            Column::Float(v) => Value::Float(v[row]),
            Column::Bool(v) => Value::Bool(v[row]),
            Column::Vector(m) => Value::Vector(m.row(row).to_owned()),
        })
    }
}

/// Набор именованных колонок одинаковой длины
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: Vec<(String, Column)>,
    n_rows: usize,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Добавляет колонку; колонка с тем же именем заменяется
    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(PipelineError::RowCount {
                column: name,
                expected: self.n_rows,
                found: column.len(),
            });
        }
        self.n_rows = column.len();

        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = column;
        } else {
            self.columns.push((name, column));
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    pub fn text(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Text(v) => Ok(v),
            other => Err(type_mismatch(name, "text", other)),
        }
    }

    pub fn floats(&self, name: &str) -> Result<&[f32]> {
        match self.column(name)? {
            Column::Float(v) => Ok(v),
            other => Err(type_mismatch(name, "float32", other)),
        }
    }

    pub fn bools(&self, name: &str) -> Result<&[bool]> {
        match self.column(name)? {
            Column::Bool(v) => Ok(v),
            other => Err(type_mismatch(name, "boolean", other)),
        }
    }

    pub fn vectors(&self, name: &str) -> Result<&Array2<f32>> {
        match self.column(name)? {
            Column::Vector(m) => Ok(m),
            other => Err(type_mismatch(name, "vector", other)),
        }
    }

    /// Значения одной строки в порядке колонок
    pub fn from_records<T: Record>(records: &[T]) -> Result<Self> {
        let schema = T::schema();
        let mut columns: Vec<Column> =
            schema.fields().iter().map(|(_, ty)| Column::empty(*ty)).collect();

        for record in records {
            for (((name, _), col), value) in
                schema.fields().iter().zip(columns.iter_mut()).zip(record.values())
            {
                push_value(name, col, value)?;
            }
        }

        let mut table = DataTable::new();
        for ((name, _), col) in schema.fields().iter().zip(columns) {
            table.insert(name.clone(), col)?;
        }
        Ok(table)
    }

    pub fn to_records<T: Record>(&self) -> Result<Vec<T>> {
        let schema = T::schema();
        let columns = schema
            .fields()
            .iter()
            .map(|(name, _)| self.column(name))
            .collect::<Result<Vec<_>>>()?;

        (0..self.n_rows)
            .map(|row| {
                let values: Vec<Value> = columns
                    .iter()
                    .filter_map(|col| col.value(row))
                    .collect();
                T::from_values(values)
            })
            .collect()
    }
}

fn type_mismatch(name: &str, expected: &'static str, found: &Column) -> PipelineError {
    PipelineError::ColumnType {
        column: name.to_string(),
        expected,
        found: found.kind(),
    }
}

fn push_value(name: &str, column: &mut Column, value: Value) -> Result<()> {
    match (column, value) {
        (Column::Text(v), Value::Text(s)) => v.push(s),
        (Column::Float(v), Value::Float(x)) => v.push(x),
        (Column::Bool(v), Value::Bool(b)) => v.push(b),
        (col, value) => {
            return Err(PipelineError::ColumnType {
                column: name.to_string(),
                expected: col.kind(),
                found: value_kind(&value),
            })
        }
    }
    Ok(())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Text(_) => "text",
        Value::Float(_) => "float32",
        Value::Bool(_) => "boolean",
        Value::Vector(_) => "vector",
    }
}

/// Типизированная запись, привязанная к фиксированной схеме
pub trait Record: Sized {
    fn schema() -> Schema;

    /// Значения в порядке схемы
    fn values(&self) -> Vec<Value>;

    fn from_values(values: Vec<Value>) -> Result<Self>;
}

//! Core data models used by the library.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the embedding column added by the join.
pub const EMBEDDING_FIELD: &str = "job_title_embedding";

/// Mapping from a distinct job title to its vector.
pub type EmbeddingMap = BTreeMap<String, Vec<f32>>;

/// Allow-listed source columns, in canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    JobTitle,
    SalaryInUsd,
    ExperienceLevel,
    EmploymentType,
    EmployeeResidence,
    CompanyLocation,
    CompanySize,
    RemoteRatio,
    WorkYear,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::JobTitle,
        Column::SalaryInUsd,
        Column::ExperienceLevel,
        Column::EmploymentType,
        Column::EmployeeResidence,
        Column::CompanyLocation,
        Column::CompanySize,
        Column::RemoteRatio,
        Column::WorkYear,
    ];

    /// Header / document field name.
    pub fn name(self) -> &'static str {
        match self {
            Column::JobTitle => "job_title",
            Column::SalaryInUsd => "salary_in_usd",
            Column::ExperienceLevel => "experience_level",
            Column::EmploymentType => "employment_type",
            Column::EmployeeResidence => "employee_residence",
            Column::CompanyLocation => "company_location",
            Column::CompanySize => "company_size",
            Column::RemoteRatio => "remote_ratio",
            Column::WorkYear => "work_year",
        }
    }

    /// Exact (case-sensitive) header lookup.
    pub fn from_header(header: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.name() == header)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One salary record. Every field is optional; `None` is a missing cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub salary_in_usd: Option<f64>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub employee_residence: Option<String>,
    #[serde(default)]
    pub company_location: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub remote_ratio: Option<i64>,
    #[serde(default)]
    pub work_year: Option<i64>,
    #[serde(default)]
    pub job_title_embedding: Option<Vec<f32>>,
}

impl Row {
    /// `true` when the cell for `column` is missing.
    pub fn is_missing(&self, column: Column) -> bool {
        match column {
            Column::JobTitle => self.job_title.is_none(),
            Column::SalaryInUsd => self.salary_in_usd.is_none(),
            Column::ExperienceLevel => self.experience_level.is_none(),
            Column::EmploymentType => self.employment_type.is_none(),
            Column::EmployeeResidence => self.employee_residence.is_none(),
            Column::CompanyLocation => self.company_location.is_none(),
            Column::CompanySize => self.company_size.is_none(),
            Column::RemoteRatio => self.remote_ratio.is_none(),
            Column::WorkYear => self.work_year.is_none(),
        }
    }

    /// Mutable slot for a text column; `None` for numeric columns.
    pub(crate) fn text_slot(&mut self, column: Column) -> Option<&mut Option<String>> {
        match column {
            Column::JobTitle => Some(&mut self.job_title),
            Column::ExperienceLevel => Some(&mut self.experience_level),
            Column::EmploymentType => Some(&mut self.employment_type),
            Column::EmployeeResidence => Some(&mut self.employee_residence),
            Column::CompanyLocation => Some(&mut self.company_location),
            Column::CompanySize => Some(&mut self.company_size),
            Column::SalaryInUsd | Column::RemoteRatio | Column::WorkYear => None,
        }
    }
}

/// Rows plus the schema they were read with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub rows: Vec<Row>,
    /// Allow-listed columns present in the source, canonical order.
    pub columns: Vec<Column>,
    /// Whether the embedding column exists (set by the join).
    pub has_embedding: bool,
}

impl Dataset {
    pub fn new(rows: Vec<Row>, columns: Vec<Column>) -> Self {
        Self {
            rows,
            columns,
            has_embedding: false,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every job title, duplicates and missing values included.
    pub fn job_titles(&self) -> impl Iterator<Item = Option<&str>> {
        self.rows.iter().map(|r| r.job_title.as_deref())
    }

    /// Number of rows carrying a vector.
    pub fn embedded_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.job_title_embedding.is_some())
            .count()
    }

    /// Maps each row's job title through `map`.
    ///
    /// An empty map leaves the dataset without an embedding column. Otherwise
    /// the column is added and rows whose title is missing or unmapped get
    /// `None`. Returns the number of rows with a vector.
    pub fn attach_embeddings(&mut self, map: &EmbeddingMap) -> usize {
        if map.is_empty() {
            return 0;
        }
        self.has_embedding = true;
        for row in &mut self.rows {
            row.job_title_embedding = row
                .job_title
                .as_deref()
                .and_then(|t| map.get(t))
                .cloned();
        }
        self.embedded_rows()
    }
}

/// Zero-based row indices with a missing value, per present column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MissingReport {
    pub by_column: BTreeMap<Column, Vec<usize>>,
}

impl MissingReport {
    pub fn from_dataset(ds: &Dataset) -> Self {
        let mut by_column = BTreeMap::new();
        for &col in &ds.columns {
            let idx: Vec<usize> = ds
                .rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_missing(col))
                .map(|(i, _)| i)
                .collect();
            if !idx.is_empty() {
                by_column.insert(col, idx);
            }
        }
        Self { by_column }
    }

    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }

    pub fn count(&self, column: Column) -> usize {
        self.by_column.get(&column).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.by_column.values().map(Vec::len).sum()
    }
}

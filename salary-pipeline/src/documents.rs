//! Row ↔ BSON document mapping.
//!
//! Only the dataset's present columns are written; a missing cell becomes an
//! explicit `null` so every document in a run carries the same keys.

use mongodb::bson::{self, Bson, Document};

use crate::record::{Column, Dataset, EMBEDDING_FIELD, Row};

/// Converts one row using the dataset's schema.
pub fn row_to_document(row: &Row, columns: &[Column], with_embedding: bool) -> Document {
    let mut doc = Document::new();
    for &col in columns {
        doc.insert(col.name(), cell(row, col));
    }
    if with_embedding {
        let v = match &row.job_title_embedding {
            Some(vec) => Bson::Array(vec.iter().map(|x| Bson::Double(f64::from(*x))).collect()),
            None => Bson::Null,
        };
        doc.insert(EMBEDDING_FIELD, v);
    }
    doc
}

/// Converts every row, in order.
pub fn dataset_to_documents(ds: &Dataset) -> Vec<Document> {
    ds.rows
        .iter()
        .map(|r| row_to_document(r, &ds.columns, ds.has_embedding))
        .collect()
}

/// Reads a stored document back; `_id` and unknown keys are ignored.
pub fn document_to_row(doc: Document) -> Result<Row, bson::de::Error> {
    bson::from_document(doc)
}

fn cell(row: &Row, col: Column) -> Bson {
    fn text(v: &Option<String>) -> Bson {
        v.as_ref().map_or(Bson::Null, |s| Bson::String(s.clone()))
    }
    fn int(v: Option<i64>) -> Bson {
        v.map_or(Bson::Null, Bson::Int64)
    }

    match col {
        Column::JobTitle => text(&row.job_title),
        Column::SalaryInUsd => row.salary_in_usd.map_or(Bson::Null, Bson::Double),
        Column::ExperienceLevel => text(&row.experience_level),
        Column::EmploymentType => text(&row.employment_type),
        Column::EmployeeResidence => text(&row.employee_residence),
        Column::CompanyLocation => text(&row.company_location),
        Column::CompanySize => text(&row.company_size),
        Column::RemoteRatio => int(row.remote_ratio),
        Column::WorkYear => int(row.work_year),
    }
}

//! Tile rows from species Parquet files
//!
//! Each species file carries a `cell` column (tile code, UTF-8) and an `area`
//! column (float64). [`TileRowSource`] reads only those two columns and hands
//! them out in batches, so a file with millions of rows never has to fit in
//! memory at once.

use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use tracing::debug;

use crate::error::{IngestError, IngestResult};

/// Rows per batch unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

pub const CELL_COLUMN: &str = "cell";
pub const AREA_COLUMN: &str = "area";

/// One (tile code, area) pair as read from a species file
#[derive(Debug, Clone, PartialEq)]
pub struct TileRow {
    pub cell: String,
    pub area: f64,
}

impl TileRow {
    pub fn new(cell: impl Into<String>, area: f64) -> Self {
        Self {
            cell: cell.into(),
            area,
        }
    }
}

/// Forward-only batch reader over one species file.
///
/// The iterator is finite and cannot be rewound; open a new source to read
/// the file again. The underlying file handle is closed when the source is
/// dropped, whichever way the caller exits.
pub struct TileRowSource {
    path: PathBuf,
    reader: ParquetRecordBatchReader,
    rows_read: usize,
    finished: bool,
}

impl std::fmt::Debug for TileRowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileRowSource")
            .field("path", &self.path)
            .field("rows_read", &self.rows_read)
            .field("finished", &self.finished)
            .finish()
    }
}

impl TileRowSource {
    /// Open `path` and prepare to read it `batch_size` rows at a time
    pub fn open(path: &Path, batch_size: usize) -> IngestResult<Self> {
        let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        let schema = builder.schema().clone();
        let mut roots = Vec::with_capacity(2);
        for (column, accepted) in [
            (CELL_COLUMN, &[DataType::Utf8, DataType::LargeUtf8][..]),
            (AREA_COLUMN, &[DataType::Float64, DataType::Float32][..]),
        ] {
            let index = schema.index_of(column).map_err(|_| {
                IngestError::Storage(format!(
                    "{} has no '{}' column",
                    path.display(),
                    column
                ))
            })?;
            let data_type = schema.field(index).data_type();
            if !accepted.contains(data_type) {
                return Err(IngestError::Storage(format!(
                    "{}: column '{}' has type {}, expected one of {:?}",
                    path.display(),
                    column,
                    data_type,
                    accepted
                )));
            }
            roots.push(index);
        }

        let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
        let total_rows = builder.metadata().file_metadata().num_rows();
        let reader = builder
            .with_projection(mask)
            .with_batch_size(batch_size.max(1))
            .build()?;

        debug!(path = %path.display(), total_rows, batch_size, "Opened species file");

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            rows_read: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows handed out so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn convert(&self, batch: &RecordBatch) -> IngestResult<Vec<TileRow>> {
        let column = |name: &str| {
            batch.column_by_name(name).ok_or_else(|| {
                IngestError::Storage(format!("{}: batch lost column '{}'", self.path.display(), name))
            })
        };

        let cells = cast(column(CELL_COLUMN)?, &DataType::Utf8)?;
        let cells = cells.as_string::<i32>();
        let areas = cast(column(AREA_COLUMN)?, &DataType::Float64)?;
        let areas = areas.as_primitive::<Float64Type>();

        let mut rows = Vec::with_capacity(batch.num_rows());
        for i in 0..batch.num_rows() {
            if cells.is_null(i) || areas.is_null(i) {
                return Err(IngestError::Storage(format!(
                    "{}: row {} has a null {}",
                    self.path.display(),
                    self.rows_read + i,
                    if cells.is_null(i) { CELL_COLUMN } else { AREA_COLUMN }
                )));
            }
            rows.push(TileRow::new(cells.value(i), areas.value(i)));
        }

        Ok(rows)
    }
}

impl Iterator for TileRowSource {
    type Item = IngestResult<Vec<TileRow>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.reader.next()? {
            Ok(batch) => self.convert(&batch),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(rows) => {
                self.rows_read += rows.len();
                Some(Ok(rows))
            },
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_files::*;
    use super::*;
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    #[test]
    fn test_reads_rows_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res_1_7.parquet");
        write_species_file(&path, &[("8a1", 0.0), ("8a2", 3.5), ("8a3", 0.25)]);

        let batches: Vec<_> = TileRowSource::open(&path, DEFAULT_BATCH_SIZE)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0],
            vec![
                TileRow::new("8a1", 0.0),
                TileRow::new("8a2", 3.5),
                TileRow::new("8a3", 0.25),
            ]
        );
    }

    #[test]
    fn test_batches_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res_2_7.parquet");
        let codes: Vec<String> = (0..2500).map(|i| format!("cell{}", i)).collect();
        let rows: Vec<(&str, f64)> = codes.iter().map(|c| (c.as_str(), 1.0)).collect();
        write_species_file(&path, &rows);

        let mut source = TileRowSource::open(&path, 1000).unwrap();
        let sizes: Vec<usize> = source.by_ref().map(|b| b.unwrap().len()).collect();

        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(source.rows_read(), 2500);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res_3_7.parquet");
        write_species_file(&path, &[]);

        let mut source = TileRowSource::open(&path, 10).unwrap();
        let rows: usize = source.by_ref().map(|b| b.unwrap().len()).sum();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_null_area_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res_4_7.parquet");
        write_nullable(&path, &[Some("a"), Some("b")], &[Some(1.0), None]);

        let mut source = TileRowSource::open(&path, 10).unwrap();
        let err = source.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("row 1 has a null area"), "{}", err);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res_5_7.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("h3", DataType::Utf8, false),
            Field::new("area", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["x"])) as ArrayRef,
                Arc::new(Float64Array::from(vec![1.0])) as ArrayRef,
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = TileRowSource::open(&path, 10).unwrap_err();
        assert!(err.to_string().contains("no 'cell' column"), "{}", err);
    }

    #[test]
    fn test_wrong_area_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res_6_7.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("cell", DataType::Utf8, false),
            Field::new("area", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["x"])) as ArrayRef,
                Arc::new(Int64Array::from(vec![1])) as ArrayRef,
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = TileRowSource::open(&path, 10).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TileRowSource::open(Path::new("/nonexistent/res_1_7.parquet"), 10).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}

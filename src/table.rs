use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use tabview::{Column, TVError, Value};

#[derive(Debug, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

/// One record of a loaded file, one value per file column.
pub type Row = Vec<Value>;

/// A data file loaded into memory as rows of values.
#[derive(Debug, Default)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn load(path: PathBuf) -> Result<Self, TVError> {
        Self::check_file(&path)?;
        let frame = match Self::detect_file_type(&path)? {
            FileType::CSV => Self::load_csv(&path)?,
            FileType::PARQUET => Self::load_parquet(&path)?,
            FileType::ARROW => Self::load_arrow(&path)?,
        };

        // Each column is converted in its own rayon task.
        let start_time = Instant::now();
        let df = Arc::new(frame.collect()?);
        let c_: Result<Vec<Vec<Value>>, _> = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::load_column(&df, name))
            .collect();
        let columns = c_?;
        let headers: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();

        let mut rows: Vec<Row> = (0..df.height())
            .map(|_| Vec::with_capacity(headers.len()))
            .collect();
        for column in columns {
            for (row, value) in rows.iter_mut().zip(column) {
                row.push(value);
            }
        }

        info!(
            "Loading {} rows took {}ms ...",
            rows.len(),
            start_time.elapsed().as_millis()
        );
        debug!("Columns: {headers:?}");

        Ok(Self {
            name: path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("???")
                .to_string(),
            headers,
            rows,
        })
    }

    /// One column definition per file column, keyed and labelled by its header.
    pub fn columns(&self) -> Vec<Column<Row>> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                Column::new(name.clone(), name.clone(), move |row: &Row| {
                    row.get(idx).cloned().unwrap_or(Value::Null)
                })
            })
            .collect()
    }

    fn check_file(path: &Path) -> Result<(), TVError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TVError::FileNotFound,
            ErrorKind::PermissionDenied => TVError::PermissionDenied,
            _ => TVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(TVError::LoadingFailed("Not a file!".into()));
        }
        debug!("Opening {} ({} bytes)", path.display(), metadata.len());
        Ok(())
    }

    fn detect_file_type(path: &Path) -> Result<FileType, TVError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(TVError::UnknownFileType),
        }
    }

    fn is_numeric_type(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        )
    }

    fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Value>, PolarsError> {
        let col = df.column(col_name)?;
        let dtype = col.dtype().clone();

        if Self::is_numeric_type(&dtype) {
            let col = col.cast(&DataType::Float64)?;
            return Ok(col.f64()?.into_iter().map(Value::from).collect());
        }
        if dtype == DataType::Boolean {
            return Ok(col.bool()?.into_iter().map(Value::from).collect());
        }

        let col = col.cast(&DataType::String)?;
        let values = col
            .str()?
            .into_iter()
            .map(|value| match value {
                Some(s) => Value::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
                None => Value::Null,
            })
            .collect();
        Ok(values)
    }

    fn load_csv(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        )
    }

    fn load_arrow(path: &PathBuf) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.as_path().into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/catalog.csv")
    }

    #[test]
    fn detects_file_types_by_extension() {
        assert_eq!(Table::detect_file_type(Path::new("a.CSV")).unwrap(), FileType::CSV);
        assert_eq!(Table::detect_file_type(Path::new("a.pq")).unwrap(), FileType::PARQUET);
        assert_eq!(Table::detect_file_type(Path::new("a.feather")).unwrap(), FileType::ARROW);
        assert!(matches!(
            Table::detect_file_type(Path::new("a.txt")),
            Err(TVError::UnknownFileType)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            Table::load(PathBuf::from("does/not/exist.csv")),
            Err(TVError::FileNotFound)
        ));
    }

    #[test]
    fn directory_is_not_loadable() {
        assert!(matches!(
            Table::load(PathBuf::from(env!("CARGO_MANIFEST_DIR"))),
            Err(TVError::LoadingFailed(_))
        ));
    }

    #[test]
    fn loads_csv_catalog() {
        let table = Table::load(fixture()).unwrap();
        assert_eq!(table.name, "catalog.csv");
        assert_eq!(table.headers, vec!["sku", "name", "category", "price", "stock"]);
        assert_eq!(table.rows.len(), 7);

        let first = &table.rows[0];
        assert_eq!(first[0], Value::from("B-100"));
        assert_eq!(first[3], Value::Number(0.20));
        assert_eq!(first[4], Value::Number(1200.0));
        // the wall anchor has no stock entry
        assert!(table.rows[5][4].is_null());
    }

    #[test]
    fn columns_read_their_position() {
        let table = Table::load(fixture()).unwrap();
        let columns = table.columns();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[1].key(), "name");
        assert_eq!(columns[1].value(&table.rows[3]), Value::from("Torque Wrench"));
        assert!(columns[0].value(&Vec::new()).is_null());
    }
}

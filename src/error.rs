//! Error types / 错误类型

use thiserror::Error;

/// Text decoding failures / 解码错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("could not detect the file encoding")]
    Undetected,
    #[error("file is not valid {encoding}")]
    Malformed { encoding: &'static str },
}

/// Record store failures / 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write / 唯一约束冲突
    #[error("duplicate {field}: {value}")]
    Uniqueness { field: String, value: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Import failures that abort the whole batch / 导致整批导入失败的错误
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("file is {size} bytes, larger than the {limit} byte import limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Caught only at commit time (same username twice in one file) / 提交时才发现的重复用户名
    #[error("duplicate username {0} in import batch, nothing was imported")]
    DuplicateUsername(String),
    #[error("{field} {value} already exists, nothing was imported")]
    Uniqueness { field: String, value: String },
    #[error("commit failed, nothing was imported: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Uniqueness { field, value } if field == "username" => {
                ImportError::DuplicateUsername(value)
            }
            StoreError::Uniqueness { field, value } => ImportError::Uniqueness { field, value },
            other => ImportError::Store(other),
        }
    }
}

/// Query / lookup failures / 查询错误
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("empty search query")]
    EmptyQuery,
    #[error("Search string must have at least 3 characters")]
    QueryTooShort,
    #[error("Record not found")]
    RecordNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        QueryError::Store(StoreError::Database(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_uniqueness_maps_to_import_error() {
        let err: ImportError = StoreError::Uniqueness {
            field: "username".to_string(),
            value: "bob".to_string(),
        }
        .into();
        assert!(matches!(err, ImportError::DuplicateUsername(ref u) if u == "bob"));

        let err: ImportError = StoreError::Uniqueness {
            field: "email".to_string(),
            value: "b@x.io".to_string(),
        }
        .into();
        assert!(matches!(err, ImportError::Uniqueness { ref field, .. } if field == "email"));
    }

    #[test]
    fn test_too_short_message() {
        assert_eq!(
            QueryError::QueryTooShort.to_string(),
            "Search string must have at least 3 characters"
        );
    }
}

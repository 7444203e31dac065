//! Bulk import of delimited text files / 批量导入
//!
//! Line format: `username----password----name----id_card----nickname----phone----email`
//!
//! Flow: size check → detect encoding on a prefix → strict decode of the whole file →
//! parse and pre-check each line (no lock held) → one transaction for all staged
//! records. Malformed lines and usernames that already exist are skipped and
//! counted; anything that fails at commit time rolls back the whole batch.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::config::ImportConfig;
use crate::encoding;
use crate::error::ImportError;
use crate::models::NewRecord;
use crate::store::RecordStore;

/// Field delimiter / 字段分隔符
pub const DELIMITER: &str = "----";
/// Fields per line / 每行字段数
pub const FIELD_COUNT: usize = 7;

/// Why a line was skipped / 跳过原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// Did not split into exactly seven fields
    Malformed { fields: usize },
    /// Username already in the store
    Duplicate { username: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineIssue {
    /// 1-based line number / 行号（从1开始）
    pub line_no: usize,
    #[serde(flatten)]
    pub kind: IssueKind,
}

/// Import summary / 导入结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub lines_read: usize,
    pub created: usize,
    pub duplicates: usize,
    pub malformed: usize,
    /// Detected encoding label / 检测到的编码
    pub encoding: String,
    pub confidence: f32,
    pub issues: Vec<LineIssue>,
    pub elapsed_ms: u64,
}

/// Parse one line into a record, `Err(field_count)` when it is malformed / 解析单行
pub fn parse_line(line: &str) -> Result<NewRecord, usize> {
    let parts: Vec<&str> = line.trim().split(DELIMITER).collect();
    let &[username, password, name, id_card, nickname, phone, email] = parts.as_slice() else {
        return Err(parts.len());
    };

    Ok(NewRecord {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        nickname: nickname.to_string(),
        name: name.to_string(),
        id_card: id_card.to_string(),
        phone: phone.to_string(),
    })
}

/// Import pipeline / 导入流程
pub struct Importer<'a> {
    store: &'a RecordStore,
    config: &'a ImportConfig,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a RecordStore, config: &'a ImportConfig) -> Self {
        Self { store, config }
    }

    /// Import a file / 导入文件
    pub async fn import(&self, path: &Path) -> Result<ImportReport, ImportError> {
        let started = Instant::now();
        let io_err = |source: std::io::Error| ImportError::Io {
            path: path.display().to_string(),
            source,
        };

        let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
        if size > self.config.max_file_bytes {
            return Err(ImportError::FileTooLarge {
                size,
                limit: self.config.max_file_bytes,
            });
        }

        let bytes = tokio::fs::read(path).await.map_err(io_err)?;
        let sample = &bytes[..bytes.len().min(self.config.detect_bytes)];
        let detection = encoding::detect(sample);
        match detection {
            Some(d) => tracing::info!(
                "Detected encoding: {} (confidence {:.2})",
                d.label(),
                d.confidence
            ),
            None => tracing::warn!("Could not detect encoding of {:?}", path),
        }

        let text = encoding::decode(&bytes, detection)?;
        let mut report = self.import_text(&text).await?;

        if let Some(d) = detection {
            report.encoding = d.label().to_string();
            report.confidence = d.confidence;
        }
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            "Import of {:?} finished: {} created, {} duplicates, {} malformed, {} lines in {}ms",
            path,
            report.created,
            report.duplicates,
            report.malformed,
            report.lines_read,
            report.elapsed_ms
        );
        Ok(report)
    }

    /// Parse, pre-check and commit already decoded text / 导入已解码的文本
    pub async fn import_text(&self, text: &str) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();
        let mut staged: Vec<NewRecord> = Vec::new();

        for (index, line) in text.lines().enumerate() {
            report.lines_read += 1;
            let line_no = index + 1;

            let record = match parse_line(line) {
                Ok(record) => record,
                Err(fields) => {
                    tracing::debug!(
                        "Invalid data format in line {} ({} fields, expected {}): {:?}",
                        line_no,
                        fields,
                        FIELD_COUNT,
                        line
                    );
                    report.malformed += 1;
                    report.issues.push(LineIssue {
                        line_no,
                        kind: IssueKind::Malformed { fields },
                    });
                    continue;
                }
            };

            if self.store.username_exists(&record.username).await? {
                tracing::debug!("Skipping duplicate username: {}", record.username);
                report.duplicates += 1;
                report.issues.push(LineIssue {
                    line_no,
                    kind: IssueKind::Duplicate {
                        username: record.username,
                    },
                });
                continue;
            }

            if let Some(field) = record.exceeds_declared_widths() {
                tracing::warn!("Line {}: {} is longer than its declared width", line_no, field);
            }

            staged.push(record);
        }

        let ids = self.store.insert_batch(&staged).await?;
        report.created = ids.len();
        Ok(report)
    }
}

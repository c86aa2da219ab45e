//! Dataset loading: local or `gs://` CSV, encoding fallbacks, cleaning.

use std::borrow::Cow;

use textlens_core::{Error, Record, Result};
use tracing::{debug, info};

const GCS_PREFIX: &str = "gs://";
const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Cell values read as missing, matching the usual dataframe NA tokens.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load `path` and return the cleaned records of column `text_col`.
pub async fn load_dataset(
    path: &str,
    text_col: &str,
    access_token: Option<&str>,
) -> Result<Vec<Record>> {
    let bytes = read_source(path, access_token).await?;
    let content = decode_with_fallbacks(&bytes);
    let rows = parse_csv(&content, text_col)?;
    let total = rows.len();
    let records = basic_clean(rows);
    info!(
        "Loaded {} rows from {} ({} kept after cleaning)",
        total,
        path,
        records.len()
    );
    Ok(records)
}

/// Raw bytes of a local file or a Cloud Storage object.
pub async fn read_source(path: &str, access_token: Option<&str>) -> Result<Vec<u8>> {
    match path.strip_prefix(GCS_PREFIX) {
        Some(object) => download_gcs(object, access_token).await,
        None => tokio::fs::read(path)
            .await
            .map_err(|e| Error::Dataset(format!("cannot read {}: {}", path, e))),
    }
}

async fn download_gcs(object: &str, access_token: Option<&str>) -> Result<Vec<u8>> {
    let (bucket, name) = object
        .split_once('/')
        .filter(|(b, n)| !b.is_empty() && !n.is_empty())
        .ok_or_else(|| Error::Storage(format!("invalid object path: gs://{}", object)))?;

    let url = format!("{}/{}/{}", GCS_ENDPOINT, bucket, name);
    debug!("Downloading {}", url);

    let client = reqwest::Client::new();
    let mut req = client.get(&url);
    if let Some(token) = access_token {
        req = req.bearer_auth(token);
    }
    let resp = req
        .send()
        .await
        .map_err(|e| Error::Storage(format!("request failed: {}", e)))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Storage(format!("GET {} returned {}: {}", url, status, body)));
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| Error::Storage(format!("download failed: {}", e)))?;
    Ok(bytes.to_vec())
}

/// Decode bytes as UTF-8 (BOM stripped), falling back to Latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so decoding
/// never fails.
pub fn decode_with_fallbacks(bytes: &[u8]) -> Cow<'_, str> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(body) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            debug!("Input is not valid UTF-8, decoding as Latin-1");
            Cow::Owned(body.iter().map(|&b| b as char).collect())
        }
    }
}

/// Values of `text_col` for every data row; empty cells and NA tokens are
/// `None`.
pub fn parse_csv(content: &str, text_col: &str) -> Result<Vec<Option<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::Dataset(format!("invalid header row: {}", e)))?;
    let col = headers
        .iter()
        .position(|h| h.trim() == text_col)
        .ok_or_else(|| {
            let available: Vec<&str> = headers.iter().collect();
            Error::Dataset(format!(
                "column '{}' not found (available: {})",
                text_col,
                available.join(", ")
            ))
        })?;

    let mut rows = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| Error::Dataset(format!("row {}: {}", i, e)))?;
        rows.push(row.get(col).filter(|v| !is_missing(v)).map(str::to_string));
    }
    Ok(rows)
}

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

/// Drop missing and blank texts, trim the rest. `row_index` keeps the
/// original data-row position.
pub fn basic_clean(rows: Vec<Option<String>>) -> Vec<Record> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(i, text)| {
            let text = text?;
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| Record::new(trimmed, i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFtext\nhello";
        assert_eq!(decode_with_fallbacks(bytes), "text\nhello");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // "café" in Latin-1.
        let bytes = b"caf\xE9";
        assert_eq!(decode_with_fallbacks(bytes), "café");
    }

    #[test]
    fn test_parse_and_clean() {
        let csv = "id,original_text\n1,\"  Great phone, love it.  \"\n2,\n3,   \n4,\"multi\nline\"\n";
        let rows = parse_csv(csv, "original_text").unwrap();
        assert_eq!(rows.len(), 4);
        let records = basic_clean(rows);
        assert_eq!(
            records,
            vec![
                Record::new("Great phone, love it.", 0),
                Record::new("multi\nline", 3),
            ]
        );
    }

    #[test]
    fn test_missing_column() {
        let err = parse_csv("id,body\n1,x\n", "original_text").unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
        assert!(err.to_string().contains("body"));
    }

    #[test]
    fn test_short_rows_count_as_missing() {
        let rows = parse_csv("original_text,id\nhello,1\n", "id").unwrap();
        assert_eq!(rows, vec![Some("1".to_string())]);
        let rows = parse_csv("id,original_text\n1\n", "original_text").unwrap();
        assert_eq!(rows, vec![None]);
    }

    #[test]
    fn test_na_tokens_count_as_missing() {
        let csv = "original_text\nNA\nN/A\nnull\nNaN\nNone\nNA is fine here\n na \n";
        let rows = parse_csv(csv, "original_text").unwrap();
        assert_eq!(rows.iter().filter(|r| r.is_none()).count(), 5);
        let records = basic_clean(rows);
        assert_eq!(
            records,
            vec![Record::new("NA is fine here", 5), Record::new("na", 6)]
        );
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"original_text\nfirst review\n\nsecond review\n")
            .unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let records = load_dataset(&path, "original_text", None).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "second review");
    }

    #[tokio::test]
    async fn test_invalid_gcs_path() {
        let err = read_source("gs://bucket-only", None).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let err = read_source("/nonexistent/textlens.csv", None).await.unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }
}

use super::*;
use crate::test_support::run_async_test;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, String> {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).map_err(|err| err.to_string())?;
    file.write_all(contents.as_bytes())
        .map_err(|err| err.to_string())?;
    Ok(path)
}

fn numbered_lines(count: usize) -> String {
    (0..count).map(|idx| format!("{{\"id\":{}}}\n", idx)).collect()
}

async fn collect(path: &Path, selection: Selection) -> Result<Vec<RequestRecord>, String> {
    let mut source = StreamSource::open(path, selection)
        .await
        .map_err(|err| err.to_string())?;
    let mut records = Vec::new();
    while let Some(record) = source.next_record().await.map_err(|err| err.to_string())? {
        records.push(record);
    }
    Ok(records)
}

fn ids(records: &[RequestRecord]) -> Vec<Value> {
    records
        .iter()
        .map(|record| record.payload.get("id").cloned().unwrap_or(Value::Null))
        .collect()
}

fn full() -> Selection {
    Selection::Full {
        range: LineRange::default(),
    }
}

#[test]
fn full_mode_skips_malformed_and_blank_lines() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(
            dir.path(),
            "data.jsonl",
            "{\"id\":0}\n\nnot json\n{\"id\":1}\n{broken\n{\"id\":2}",
        )?;
        let mut source = StreamSource::open(&path, full())
            .await
            .map_err(|err| err.to_string())?;
        let mut records = Vec::new();
        while let Some(record) = source.next_record().await.map_err(|err| err.to_string())? {
            records.push(record);
        }
        if ids(&records) != vec![json!(0), json!(1), json!(2)] {
            return Err(format!("Unexpected records: {:?}", records));
        }
        let sequences: Vec<u64> = records.iter().map(|record| record.sequence).collect();
        if sequences != vec![1, 2, 3] {
            return Err(format!("Unexpected sequence numbers: {:?}", sequences));
        }
        if source.skipped() != 2 {
            return Err(format!("Expected 2 skipped lines, got {}", source.skipped()));
        }
        Ok(())
    })
}

#[test]
fn full_mode_honors_physical_line_range() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(10))?;
        let records = collect(
            &path,
            Selection::Full {
                range: LineRange::new(Some(3), Some(5)),
            },
        )
        .await?;
        if ids(&records) != vec![json!(2), json!(3), json!(4)] {
            return Err(format!("Unexpected ranged records: {:?}", ids(&records)));
        }
        Ok(())
    })
}

#[test]
fn empty_source_yields_nothing() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", "\n\nnope\n")?;
        let records = collect(&path, full()).await?;
        if !records.is_empty() {
            return Err("Expected empty sequence".to_owned());
        }
        Ok(())
    })
}

#[test]
fn missing_file_is_an_error() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let result = StreamSource::open(&dir.path().join("absent.jsonl"), full()).await;
        match result {
            Err(crate::error::AppError::Source(crate::error::SourceError::NotFound { .. })) => Ok(()),
            Err(err) => Err(format!("Unexpected error: {}", err)),
            Ok(_) => Err("Expected not found error".to_owned()),
        }
    })
}

#[test]
fn unsupported_extension_is_rejected() -> Result<(), String> {
    if SourceFormat::from_path(Path::new("data.csv")).is_ok() {
        return Err("Expected csv to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn json_document_list_and_single_object() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let list = write_file(dir.path(), "list.json", r#"[{"id":0},{"id":1}]"#)?;
        let single = write_file(dir.path(), "one.json", r#"{"id":7}"#)?;
        let broken = write_file(dir.path(), "broken.json", r#"{"id":"#)?;

        if ids(&collect(&list, full()).await?) != vec![json!(0), json!(1)] {
            return Err("List document not read".to_owned());
        }
        if ids(&collect(&single, full()).await?) != vec![json!(7)] {
            return Err("Single object document not read".to_owned());
        }
        if !collect(&broken, full()).await?.is_empty() {
            return Err("Malformed document should yield no records".to_owned());
        }
        Ok(())
    })
}

#[test]
fn first_n_takes_prefix_and_falls_back_to_all() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(5))?;
        let prefix = collect(&path, Selection::FirstN { count: 2 }).await?;
        if ids(&prefix) != vec![json!(0), json!(1)] {
            return Err(format!("Unexpected prefix: {:?}", ids(&prefix)));
        }
        let all = collect(&path, Selection::FirstN { count: 50 }).await?;
        if all.len() != 5 {
            return Err(format!("Expected all 5 records, got {}", all.len()));
        }
        Ok(())
    })
}

#[test]
fn exact_count_pads_with_first_record() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(3))?;
        let records = collect(
            &path,
            Selection::ExactCount {
                count: 5,
                fill: true,
            },
        )
        .await?;
        if ids(&records) != vec![json!(0), json!(1), json!(2), json!(0), json!(0)] {
            return Err(format!("Unexpected padded records: {:?}", ids(&records)));
        }
        let sequences: Vec<u64> = records.iter().map(|record| record.sequence).collect();
        if sequences != vec![1, 2, 3, 4, 5] {
            return Err(format!("Padding must get fresh sequence numbers: {:?}", sequences));
        }
        Ok(())
    })
}

#[test]
fn exact_count_without_fill_returns_short_list() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(3))?;
        let records = collect(
            &path,
            Selection::ExactCount {
                count: 5,
                fill: false,
            },
        )
        .await?;
        if records.len() != 3 {
            return Err(format!("Expected 3 records, got {}", records.len()));
        }
        Ok(())
    })
}

#[test]
fn exact_count_truncates_long_sources() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(8))?;
        let records = collect(
            &path,
            Selection::ExactCount {
                count: 4,
                fill: true,
            },
        )
        .await?;
        if ids(&records) != vec![json!(0), json!(1), json!(2), json!(3)] {
            return Err(format!("Unexpected records: {:?}", ids(&records)));
        }
        Ok(())
    })
}

#[test]
fn exact_count_on_empty_source_yields_nothing() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", "")?;
        let records = collect(
            &path,
            Selection::ExactCount {
                count: 3,
                fill: true,
            },
        )
        .await?;
        if !records.is_empty() {
            return Err("Nothing to pad with, expected empty output".to_owned());
        }
        Ok(())
    })
}

#[test]
fn random_n_draws_distinct_records() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(100))?;
        let records = collect(
            &path,
            Selection::RandomN {
                count: 10,
                seed: None,
            },
        )
        .await?;
        if records.len() != 10 {
            return Err(format!("Expected 10 records, got {}", records.len()));
        }
        let distinct: HashSet<String> = ids(&records).iter().map(Value::to_string).collect();
        if distinct.len() != 10 {
            return Err("Sample contains duplicates".to_owned());
        }
        let in_range = ids(&records)
            .iter()
            .all(|id| id.as_u64().is_some_and(|value| value < 100));
        if !in_range {
            return Err("Sample contains records not in the source".to_owned());
        }
        Ok(())
    })
}

#[test]
fn random_n_is_reproducible_with_seed() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(50))?;
        let selection = Selection::RandomN {
            count: 7,
            seed: Some(42),
        };
        let first = ids(&collect(&path, selection.clone()).await?);
        let second = ids(&collect(&path, selection).await?);
        if first != second {
            return Err("Same seed produced different samples".to_owned());
        }
        Ok(())
    })
}

#[test]
fn random_n_larger_than_source_returns_all() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(4))?;
        let records = collect(
            &path,
            Selection::RandomN {
                count: 10,
                seed: Some(1),
            },
        )
        .await?;
        if records.len() != 4 {
            return Err(format!("Expected all 4 records, got {}", records.len()));
        }
        Ok(())
    })
}

#[test]
fn random_n_covering_whole_source_is_shuffled() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(30))?;
        let records = collect(
            &path,
            Selection::RandomN {
                count: 30,
                seed: Some(7),
            },
        )
        .await?;
        let drawn: Vec<u64> = ids(&records).iter().filter_map(Value::as_u64).collect();
        let source_order: Vec<u64> = (0..30).collect();
        if drawn == source_order {
            return Err("Sample came back in source order".to_owned());
        }
        let mut sorted = drawn;
        sorted.sort_unstable();
        if sorted != source_order {
            return Err(format!("Sample is not a permutation of the source: {:?}", sorted));
        }
        Ok(())
    })
}

#[test]
fn first_sequence_offsets_numbering() -> Result<(), String> {
    run_async_test(async {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let path = write_file(dir.path(), "data.jsonl", &numbered_lines(3))?;
        let mut source = StreamSource::open(&path, full())
            .await
            .map_err(|err| err.to_string())?
            .with_first_sequence(2);
        let mut sequences = Vec::new();
        while let Some(record) = source.next_record().await.map_err(|err| err.to_string())? {
            sequences.push(record.sequence);
        }
        if sequences != vec![2, 3, 4] || source.emitted() != 3 {
            return Err(format!("Unexpected sequence numbers {:?}", sequences));
        }
        Ok(())
    })
}

use crate::config::toml_config::{InputColumns, LayoutConfig, OutputConfig, ReferenceColumns};
use crate::domain::model::{AnnotatedRecord, InputRecord, InputTable, ReferenceRecord};
use crate::utils::error::{EtlError, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub na_values: HashSet<String>,
}

impl CsvOptions {
    pub fn from_layout(layout: &LayoutConfig) -> Result<Self> {
        Ok(Self {
            delimiter: layout.parsing.delimiter_byte()?,
            na_values: layout.parsing.na_set(),
        })
    }

    fn cell(&self, row: &StringRecord, position: usize) -> Option<String> {
        row.get(position)
            .filter(|value| !self.na_values.contains(*value))
            .map(str::to_string)
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self::from_layout(&LayoutConfig::default()).unwrap_or_else(|_| Self {
            delimiter: b',',
            na_values: HashSet::new(),
        })
    }
}

/// Short rows are allowed and their missing trailing cells read as absent; long rows are not.
fn check_row_width(row: &StringRecord, width: usize, file: &str) -> Result<()> {
    if row.len() > width {
        let line = row.position().map_or(0, |p| p.line());
        return Err(EtlError::ValidationError {
            message: format!(
                "{} line {} has {} fields but the header has {}",
                file,
                line,
                row.len(),
                width
            ),
        });
    }
    Ok(())
}

fn column_position(headers: &StringRecord, file: &str, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| EtlError::MissingColumnError {
            file: file.to_string(),
            column: column.to_string(),
        })
}

pub fn read_input_table(
    data: &[u8],
    file: &str,
    columns: &InputColumns,
    options: &CsvOptions,
) -> Result<InputTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let postcode_at = column_position(&headers, file, &columns.postcode)?;
    let line_positions = columns
        .address_lines
        .iter()
        .map(|column| column_position(&headers, file, column))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        check_row_width(&row, headers.len(), file)?;
        let mut raw: Vec<String> = row.iter().map(str::to_string).collect();
        raw.resize(headers.len(), String::new());
        records.push(InputRecord {
            postcode: options.cell(&row, postcode_at),
            address_lines: line_positions
                .iter()
                .map(|&position| options.cell(&row, position))
                .collect(),
            raw,
        });
    }

    tracing::debug!("Read {} input records from {}", records.len(), file);
    Ok(InputTable {
        headers: headers.iter().map(str::to_string).collect(),
        records,
    })
}

/// Rows without a postcode can never be selected by a lookup and are dropped.
pub fn read_reference(
    data: &[u8],
    file: &str,
    columns: &ReferenceColumns,
    options: &CsvOptions,
) -> Result<Vec<ReferenceRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let postcode_at = column_position(&headers, file, &columns.postcode)?;
    let street_at = column_position(&headers, file, &columns.street_name)?;
    let address_at = column_position(&headers, file, &columns.full_address)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row?;
        check_row_width(&row, headers.len(), file)?;
        let Some(postcode) = options.cell(&row, postcode_at) else {
            skipped += 1;
            continue;
        };
        records.push(ReferenceRecord {
            postcode,
            street_name: options.cell(&row, street_at),
            full_address: options.cell(&row, address_at),
        });
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} reference rows without a postcode in {}", skipped, file);
    }
    tracing::debug!("Read {} reference records from {}", records.len(), file);
    Ok(records)
}

/// Writes every input column in its original order plus the flag column.
/// An existing column with the flag's name is overwritten in place.
pub fn write_annotated(
    headers: &[String],
    records: &[AnnotatedRecord],
    output: &OutputConfig,
    delimiter: u8,
) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    let existing_flag_at = headers.iter().position(|h| *h == output.flag_column);

    let mut header_row: Vec<&str> = Vec::with_capacity(headers.len() + 2);
    if output.include_index {
        header_row.push("");
    }
    header_row.extend(headers.iter().map(String::as_str));
    if existing_flag_at.is_none() {
        header_row.push(&output.flag_column);
    }
    writer.write_record(&header_row)?;

    for (row_number, annotated) in records.iter().enumerate() {
        let flag = annotated.street_in_postcode.as_str();
        let mut row: Vec<String> = Vec::with_capacity(header_row.len());
        if output.include_index {
            row.push(row_number.to_string());
        }
        for (position, value) in annotated.record.raw.iter().enumerate() {
            if Some(position) == existing_flag_at {
                row.push(flag.to_string());
            } else {
                row.push(value.clone());
            }
        }
        if existing_flag_at.is_none() {
            row.push(flag.to_string());
        }
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::StreetFlag;

    const INPUT_CSV: &str = "\
Id,Postcode,Address_Line_1,Address_Line_2,Address_Line_3,Address_Line_4,Address_Line_5
1,AB1 2CD,High,,,,
2,NA,Old Road,Town,,,
3,EF3 4GH,\"7, Mill Lane\",NULL,,,Village
";

    const REFERENCE_CSV: &str = "\
UPRN,POSTCODE,STREET_NAME,SINGLE_LINE_ADDRESS
100,AB1 2CD,High Street,\"1 High Street, Town\"
101,AB1 2CD,,\"1 Old Road, Town\"
102,,Nowhere Lane,\"Nowhere Lane, Town\"
103,EF3 4GH,Mill Lane,NaN
";

    #[test]
    fn test_read_input_table() {
        let table = read_input_table(
            INPUT_CSV.as_bytes(),
            "input.csv",
            &InputColumns::default(),
            &CsvOptions::default(),
        )
        .unwrap();

        assert_eq!(table.headers.len(), 7);
        assert_eq!(table.headers[0], "Id");
        assert_eq!(table.records.len(), 3);

        let first = &table.records[0];
        assert_eq!(first.postcode.as_deref(), Some("AB1 2CD"));
        assert_eq!(first.fragments(), vec!["High", "", "", "", ""]);

        // NA tokens are absent, but the raw text is kept for output
        let second = &table.records[1];
        assert_eq!(second.postcode, None);
        assert_eq!(second.raw[1], "NA");

        let third = &table.records[2];
        assert_eq!(third.address_lines[0].as_deref(), Some("7, Mill Lane"));
        assert_eq!(third.address_lines[1], None);
        assert_eq!(third.address_lines[4].as_deref(), Some("Village"));
    }

    #[test]
    fn test_read_reference_drops_rows_without_postcode() {
        let records = read_reference(
            REFERENCE_CSV.as_bytes(),
            "abp.csv",
            &ReferenceColumns::default(),
            &CsvOptions::default(),
        )
        .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            ReferenceRecord::new("AB1 2CD", Some("High Street"), Some("1 High Street, Town"))
        );
        assert_eq!(records[1].street_name, None);
        assert_eq!(records[2].full_address, None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err = read_reference(
            "POSTCODE,STREET_NAME\nAB1 2CD,High Street\n".as_bytes(),
            "abp.csv",
            &ReferenceColumns::default(),
            &CsvOptions::default(),
        )
        .unwrap_err();

        match err {
            EtlError::MissingColumnError { file, column } => {
                assert_eq!(file, "abp.csv");
                assert_eq!(column, "SINGLE_LINE_ADDRESS");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = read_input_table(
            "Postcode,Address_Line_1\nAB1 2CD,High\n".as_bytes(),
            "input.csv",
            &InputColumns::default(),
            &CsvOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::MissingColumnError { ref column, .. } if column == "Address_Line_2"));
    }

    #[test]
    fn test_long_row_is_rejected() {
        let err = read_input_table(
            "Postcode,Address_Line_1\nAB1 2CD,High,extra\n".as_bytes(),
            "input.csv",
            &InputColumns {
                postcode: "Postcode".to_string(),
                address_lines: vec!["Address_Line_1".to_string()],
            },
            &CsvOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::ValidationError { .. }));
    }

    #[test]
    fn test_short_row_pads_missing_cells() {
        let table = read_input_table(
            "Postcode,Address_Line_1,Address_Line_2,Address_Line_3,Address_Line_4,Address_Line_5\nAB1 2CD,High\n"
                .as_bytes(),
            "input.csv",
            &InputColumns::default(),
            &CsvOptions::default(),
        )
        .unwrap();

        let record = &table.records[0];
        assert_eq!(record.postcode.as_deref(), Some("AB1 2CD"));
        assert_eq!(record.fragments(), vec!["High", "", "", "", ""]);
        assert_eq!(record.address_lines[4], None);
        assert_eq!(record.raw.len(), 6);

        let records = read_reference(
            "POSTCODE,STREET_NAME,SINGLE_LINE_ADDRESS\nAB1 2CD,High Street\n".as_bytes(),
            "abp.csv",
            &ReferenceColumns::default(),
            &CsvOptions::default(),
        )
        .unwrap();
        assert_eq!(records[0].street_name.as_deref(), Some("High Street"));
        assert_eq!(records[0].full_address, None);
    }

    #[test]
    fn test_short_row_writes_rectangular_output() {
        let columns = InputColumns {
            postcode: "Postcode".to_string(),
            address_lines: vec!["Address_Line_1".to_string()],
        };
        let table = read_input_table(
            "Id,Postcode,Address_Line_1\n1,AB1 2CD\n".as_bytes(),
            "input.csv",
            &columns,
            &CsvOptions::default(),
        )
        .unwrap();
        let annotated: Vec<AnnotatedRecord> = table
            .records
            .into_iter()
            .map(|record| AnnotatedRecord {
                record,
                street_in_postcode: StreetFlag::No,
            })
            .collect();

        let bytes = write_annotated(&table.headers, &annotated, &OutputConfig::default(), b',').unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Id,Postcode,Address_Line_1,Street_In_Postcode\n1,AB1 2CD,,No\n"
        );
    }

    #[test]
    fn test_custom_na_values_and_delimiter() {
        let options = CsvOptions {
            delimiter: b'\t',
            na_values: ["-".to_string()].into_iter().collect(),
        };
        let table = read_input_table(
            "Postcode\tAddress_Line_1\nAB1 2CD\t-\nNA\tHigh\n".as_bytes(),
            "input.tsv",
            &InputColumns {
                postcode: "Postcode".to_string(),
                address_lines: vec!["Address_Line_1".to_string()],
            },
            &options,
        )
        .unwrap();

        assert_eq!(table.records[0].address_lines[0], None);
        assert_eq!(table.records[1].postcode.as_deref(), Some("NA"));
    }

    fn annotated(raw: &[&str], flag: StreetFlag) -> AnnotatedRecord {
        AnnotatedRecord {
            record: InputRecord {
                postcode: None,
                address_lines: vec![],
                raw: raw.iter().map(|v| v.to_string()).collect(),
            },
            street_in_postcode: flag,
        }
    }

    #[test]
    fn test_write_appends_flag_column() {
        let headers = vec!["Postcode".to_string(), "Address_Line_1".to_string()];
        let records = vec![
            annotated(&["AB1 2CD", "High, Town"], StreetFlag::Yes),
            annotated(&["NA", ""], StreetFlag::No),
        ];

        let bytes = write_annotated(&headers, &records, &OutputConfig::default(), b',').unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "Postcode,Address_Line_1,Street_In_Postcode\n\
             AB1 2CD,\"High, Town\",Yes\n\
             NA,,No\n"
        );
    }

    #[test]
    fn test_write_replaces_existing_flag_column_and_adds_index() {
        let headers = vec![
            "Postcode".to_string(),
            "Street_In_Postcode".to_string(),
            "Address_Line_1".to_string(),
        ];
        let records = vec![
            annotated(&["AB1 2CD", "No", "High"], StreetFlag::Yes),
            annotated(&["EF3 4GH", "", "Mill"], StreetFlag::No),
        ];
        let output = OutputConfig {
            include_index: true,
            ..OutputConfig::default()
        };

        let bytes = write_annotated(&headers, &records, &output, b',').unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            ",Postcode,Street_In_Postcode,Address_Line_1\n\
             0,AB1 2CD,Yes,High\n\
             1,EF3 4GH,No,Mill\n"
        );
    }
}

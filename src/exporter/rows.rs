// file: src/exporter/rows.rs
// description: flattens record results into fixed-column tabular rows
// reference: dashboard spreadsheet export layouts

use crate::models::record::RecordResult;

/// The kunye export column order is part of the external contract; the
/// header strings below must not be reordered or renamed.
pub const KUNYE_HEADERS: &[&str] = &[
    "Satır",
    "Kaynak",
    "Durum",
    "Yayın Adı",
    "Yayın Grubu",
    "Adres",
    "Telefon",
    "Faks",
    "Email",
    "Web Sitesi",
    "Notlar",
    "Hata",
    "Kişi Ad Soyad",
    "Kişi Görev",
    "Kişi Telefon",
    "Kişi Email",
];

pub const IFLAS_HEADERS: &[&str] = &[
    "Sıra",
    "Dosya",
    "Ad Soyad / Ünvan",
    "TCKN",
    "VKN",
    "Adres",
    "İcra/İflas Müdürlüğü",
    "Dosya Yılı",
    "İlan Türü",
    "İlan Tarihi",
    "Davacılar",
    "Kaynak",
    "Güven",
];

pub const OCR_HEADERS: &[&str] = &["Sıra", "Dosya", "Metin"];

const STATUS_SUCCESS: &str = "Başarılı";
const STATUS_FAILED: &str = "Başarısız";

/// A fully materialized export table: fixed headers plus cell rows. Building
/// one is pure; exporting the same records twice yields identical tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

fn cell(record: &RecordResult, field: &str) -> String {
    record.scalar(field).unwrap_or_default()
}

fn status_cell(record: &RecordResult) -> String {
    if record.is_success() {
        STATUS_SUCCESS.to_string()
    } else {
        STATUS_FAILED.to_string()
    }
}

/// Kunye rows expand the nested person list: exactly one output row per
/// person, repeating the parent scalars; a record with no people emits
/// exactly one row with the person columns blank.
pub fn kunye_table(records: &[RecordResult]) -> ResultTable {
    let mut table = ResultTable::new(KUNYE_HEADERS);

    for record in records {
        let base = vec![
            record.index.to_string(),
            record.source_id.clone(),
            status_cell(record),
            cell(record, "yayin_adi"),
            cell(record, "yayin_grubu"),
            cell(record, "adres"),
            cell(record, "telefon"),
            cell(record, "faks"),
            cell(record, "email"),
            cell(record, "web_sitesi"),
            cell(record, "notlar"),
            record.error_message.clone().unwrap_or_default(),
        ];

        let people = record.people();
        if people.is_empty() {
            let mut row = base;
            row.extend(std::iter::repeat(String::new()).take(4));
            table.rows.push(row);
        } else {
            for person in people {
                let mut row = base.clone();
                row.push(person.ad_soyad.unwrap_or_default());
                row.push(person.gorev.unwrap_or_default());
                row.push(person.telefon.unwrap_or_default());
                row.push(person.email.unwrap_or_default());
                table.rows.push(row);
            }
        }
    }

    table
}

/// Iflas rows stay one-per-record; the claimant list is joined into a single
/// cell the way the dashboard exports it.
pub fn iflas_table(records: &[RecordResult]) -> ResultTable {
    let mut table = ResultTable::new(IFLAS_HEADERS);

    for record in records {
        let davacilar = match record.fields.get("davacilar") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => String::new(),
        };

        table.rows.push(vec![
            record.index.to_string(),
            record.source_id.clone(),
            cell(record, "ad_soyad_unvan"),
            cell(record, "tckn"),
            cell(record, "vkn"),
            cell(record, "adres"),
            cell(record, "icra_iflas_mudurlugu"),
            cell(record, "dosya_yili"),
            cell(record, "ilan_turu"),
            cell(record, "ilan_tarihi"),
            davacilar,
            cell(record, "kaynak"),
            cell(record, "confidence"),
        ]);
    }

    table
}

pub fn ocr_table(records: &[RecordResult]) -> ResultTable {
    let mut table = ResultTable::new(OCR_HEADERS);

    for record in records {
        table.rows.push(vec![
            record.index.to_string(),
            record.source_id.clone(),
            record
                .raw_text
                .clone()
                .or_else(|| record.scalar("text"))
                .unwrap_or_default(),
        ]);
    }

    table
}

use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

const CASE_COLUMNS: &[&[&str]] = &[
    &["Idade"],
    &["Peso"],
    &["Gravidade"],
    &["Dor"],
    &["Mobilidade"],
    &["Apetite"],
    &["Temperatura"],
    &["Doenca", "Doença"],
    &["Eutanasia"],
    &["Alta"],
    &["Internar"],
    &["Dias Internado"],
];

const DISEASE_COLUMNS: &[&[&str]] = &[&["Doenca", "Doença"]];

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {table} table: {source}")]
    Io {
        table: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid CSV data in {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("{table} table is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("{table} table has no rows")]
    EmptyTable { table: &'static str },
}

/// One historical case used for training.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseRecord {
    #[serde(rename = "Idade")]
    pub age_years: f64,
    #[serde(rename = "Peso")]
    pub weight_kg: f64,
    #[serde(rename = "Gravidade")]
    pub severity: u8,
    #[serde(rename = "Dor")]
    pub pain: u8,
    #[serde(rename = "Mobilidade")]
    pub mobility: String,
    #[serde(rename = "Apetite")]
    pub appetite: String,
    #[serde(rename = "Temperatura")]
    pub temperature_c: f64,
    #[serde(
        rename = "Doenca",
        alias = "Doença",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub disease: Option<String>,
    #[serde(rename = "Eutanasia", deserialize_with = "binary_flag")]
    pub euthanasia: bool,
    #[serde(rename = "Alta", deserialize_with = "binary_flag")]
    pub discharged: bool,
    #[serde(rename = "Internar", deserialize_with = "binary_flag")]
    pub admitted: bool,
    /// Only meaningful when `admitted` is set.
    #[serde(
        rename = "Dias Internado",
        default,
        deserialize_with = "empty_number_as_none"
    )]
    pub stay_days: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DiseaseRow {
    #[serde(
        rename = "Doenca",
        alias = "Doença",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    name: Option<String>,
}

/// The three reference tables the pipeline is trained from.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    pub cases: Vec<CaseRecord>,
    pub grave_diseases: Vec<String>,
    pub common_diseases: Vec<String>,
}

impl TrainingData {
    pub fn from_paths<P: AsRef<Path>>(
        cases: P,
        grave_diseases: P,
        common_diseases: Option<P>,
    ) -> Result<Self, DatasetError> {
        let cases_file = open("cases", cases.as_ref())?;
        let grave_file = open("grave disease", grave_diseases.as_ref())?;
        let common_file = common_diseases
            .map(|path| open("common disease", path.as_ref()))
            .transpose()?;

        Self::from_readers(cases_file, grave_file, common_file)
    }

    pub fn from_readers<C: Read, G: Read, M: Read>(
        cases: C,
        grave_diseases: G,
        common_diseases: Option<M>,
    ) -> Result<Self, DatasetError> {
        let cases = load_case_records(cases)?;
        let grave_diseases = load_disease_names(grave_diseases, "grave disease")?;
        let common_diseases = match common_diseases {
            Some(reader) => load_disease_names(reader, "common disease")?,
            None => Vec::new(),
        };

        info!(
            cases = cases.len(),
            grave_diseases = grave_diseases.len(),
            common_diseases = common_diseases.len(),
            "training tables loaded"
        );

        Ok(Self {
            cases,
            grave_diseases,
            common_diseases,
        })
    }
}

pub fn load_case_records<R: Read>(reader: R) -> Result<Vec<CaseRecord>, DatasetError> {
    let table = "cases";
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    check_headers(&mut csv_reader, table, CASE_COLUMNS)?;

    let records = csv_reader
        .deserialize::<CaseRecord>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| DatasetError::Csv { table, source })?;

    if records.is_empty() {
        return Err(DatasetError::EmptyTable { table });
    }
    Ok(records)
}

/// Raw disease names in table order; blank cells are skipped.
pub fn load_disease_names<R: Read>(
    reader: R,
    table: &'static str,
) -> Result<Vec<String>, DatasetError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    check_headers(&mut csv_reader, table, DISEASE_COLUMNS)?;

    let mut names = Vec::new();
    for row in csv_reader.deserialize::<DiseaseRow>() {
        let row = row.map_err(|source| DatasetError::Csv { table, source })?;
        if let Some(name) = row.name {
            names.push(name);
        }
    }

    if names.is_empty() {
        return Err(DatasetError::EmptyTable { table });
    }
    Ok(names)
}

fn open(table: &'static str, path: &Path) -> Result<File, DatasetError> {
    File::open(path).map_err(|source| DatasetError::Io { table, source })
}

fn check_headers<R: Read>(
    reader: &mut csv::Reader<R>,
    table: &'static str,
    required: &[&[&'static str]],
) -> Result<(), DatasetError> {
    let headers = reader
        .headers()
        .map_err(|source| DatasetError::Csv { table, source })?;

    for names in required {
        let present = names
            .iter()
            .any(|name| headers.iter().any(|header| header.trim_start_matches('\u{feff}') == *name));
        if !present {
            return Err(DatasetError::MissingColumn {
                table,
                column: names[0],
            });
        }
    }
    Ok(())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn empty_number_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .replace(',', ".")
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn binary_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim() {
        "1" | "1.0" => Ok(true),
        "0" | "0.0" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected 0 or 1, found '{other}'"
        ))),
    }
}

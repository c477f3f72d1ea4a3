use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::string::FromUtf8Error;

#[derive(Debug)]
pub enum ImportFileError {
    Io(std::io::Error),
    Encoding(FromUtf8Error),
    NotEnoughLines(usize),
}

#[derive(Debug, PartialEq)]
pub struct UnresolvedMappingError {
    fields: Vec<&'static str>,
}

impl UnresolvedMappingError {
    pub fn new(fields: Vec<&'static str>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowError {
    line: usize,
    missing: Vec<&'static str>,
}

impl RowError {
    pub fn new(line: usize, missing: Vec<&'static str>) -> Self {
        Self { line, missing }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }
}

#[derive(Debug)]
pub enum ImportError {
    File(ImportFileError),
    Mapping(UnresolvedMappingError),
    InProgress,
    Store(StoreError),
}

#[derive(Debug, PartialEq)]
pub enum StudentError {
    NameRequired,
    PhoneRequired,
    EmailRequired,
    TrainingRequired,
    InvalidEmail(String),
}

#[derive(Debug)]
pub enum RosterError {
    Student(StudentError),
    NoSuchStudent(String),
    NoSuchTraining(String),
    Store(StoreError),
}

#[derive(Debug)]
pub enum ExportError {
    SerializeError(csv::Error),
    EncodingError(FromUtf8Error),
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ImportFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImportFileError::Io(err) => write!(f, "failed to read import file: {}", err),
            ImportFileError::Encoding(err) => {
                write!(f, "import file is not valid UTF-8 text: {}", err)
            }
            ImportFileError::NotEnoughLines(count) => write!(
                f,
                "import file must contain a header row and at least one data row, found {} non-blank lines",
                count
            ),
        }
    }
}

impl fmt::Display for UnresolvedMappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "required fields are not mapped to any column: {}",
            self.fields.join(", ")
        )
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: missing required values: {}",
            self.line,
            self.missing.join(", ")
        )
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::File(err) => write!(f, "{}", err),
            ImportError::Mapping(err) => write!(f, "unable to commit import: {}", err),
            ImportError::InProgress => write!(f, "another import is already in progress"),
            ImportError::Store(err) => write!(f, "failed to persist imported records: {}", err),
        }
    }
}

impl fmt::Display for StudentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StudentError::NameRequired => write!(f, "student name must not be empty"),
            StudentError::PhoneRequired => write!(f, "student phone must not be empty"),
            StudentError::EmailRequired => write!(f, "student email must not be empty"),
            StudentError::TrainingRequired => {
                write!(f, "student training name must not be empty")
            }
            StudentError::InvalidEmail(email) => {
                write!(f, "email address {:?} is missing an @", email)
            }
        }
    }
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Student(err) => write!(f, "invalid student record: {}", err),
            RosterError::NoSuchStudent(id) => write!(f, "no such student: {}", id),
            RosterError::NoSuchTraining(id) => write!(f, "no such training: {}", id),
            RosterError::Store(err) => write!(f, "failed to persist roster: {}", err),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::SerializeError(err) => {
                write!(f, "failed to serialize export record: {}", err)
            }
            ExportError::EncodingError(err) => write!(f, "failed to encode csv export: {}", err),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "failed to access roster data: {}", err),
            StoreError::Json(err) => write!(f, "failed to encode roster data: {}", err),
        }
    }
}

impl From<std::io::Error> for ImportFileError {
    fn from(err: std::io::Error) -> Self {
        ImportFileError::Io(err)
    }
}

impl From<FromUtf8Error> for ImportFileError {
    fn from(err: FromUtf8Error) -> Self {
        ImportFileError::Encoding(err)
    }
}

impl From<ImportFileError> for ImportError {
    fn from(err: ImportFileError) -> Self {
        ImportError::File(err)
    }
}

impl From<UnresolvedMappingError> for ImportError {
    fn from(err: UnresolvedMappingError) -> Self {
        ImportError::Mapping(err)
    }
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        ImportError::Store(err)
    }
}

impl From<StudentError> for RosterError {
    fn from(err: StudentError) -> Self {
        RosterError::Student(err)
    }
}

impl From<StoreError> for RosterError {
    fn from(err: StoreError) -> Self {
        RosterError::Store(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::SerializeError(err)
    }
}

impl From<FromUtf8Error> for ExportError {
    fn from(err: FromUtf8Error) -> Self {
        ExportError::EncodingError(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Json(err)
    }
}

impl Error for ImportFileError {}
impl Error for UnresolvedMappingError {}
impl Error for RowError {}
impl Error for ImportError {}
impl Error for StudentError {}
impl Error for RosterError {}
impl Error for ExportError {}
impl Error for StoreError {}

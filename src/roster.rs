use crate::errors::{
    ExportError, ImportError, ImportFileError, RosterError, RowError, StoreError, StudentError,
};
use crate::import::{self, ColumnMapping};
use crate::store::RosterStore;
use chrono::{DateTime, Utc};
use csv::QuoteStyle;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// At most this many row errors are surfaced to the user after an import;
/// the rest stay available through [`ImportSummary::errors`].
pub const MAX_DISPLAYED_ERRORS: usize = 5;

/// The activity log keeps only the most recent entries.
const ACTIVITY_LOG_CAP: usize = 50;

/// Fixed header of the CSV export format.
pub const EXPORT_HEADER: &str = "Nome,Celular,Email,Treinamento";

/// The canonical training catalog. Any operation taking a training name
/// also accepts a free-form custom value; this list exists for selection
/// UIs and reporting.
pub const TRAINING_OPTIONS: [&str; 18] = [
    "ASBIE",
    "Comunidade Portal",
    "Conexão 2020",
    "Desperte o seu talento",
    "Embaixadores do Bem",
    "Formação em Inteligência Emocional",
    "Formação Master em Inteligência Emocional",
    "Imersão Inside",
    "Inteligência Emocional Online",
    "Liberdade Financeira",
    "Lotus Inteligência Emocional",
    "Lotus Legado",
    "Origens Inteligência Emocional",
    "Reencontro IE para Casais",
    "SBIE Care",
    "Sócio SBIE",
    "Superação Emocional",
    "Workshop Mulheres",
];

pub fn is_canonical_training(name: &str) -> bool {
    TRAINING_OPTIONS.contains(&name)
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub training: String,
}

impl StudentRecord {
    /// Builds a record from already-validated values, generating a fresh id
    /// and normalizing the phone and email on the way in.
    pub(crate) fn from_row(name: &str, phone: &str, email: &str, training: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            phone: normalize_phone(phone),
            email: normalize_email(email),
            training: training.trim().to_string(),
        }
    }

    /// Validates and builds a record from manual form entry. All four
    /// values must be non-empty after trimming and the email must contain
    /// an `@`.
    pub fn create(
        name: &str,
        phone: &str,
        email: &str,
        training: &str,
    ) -> Result<Self, StudentError> {
        Self::validate(name, phone, email, training)?;
        Ok(Self::from_row(name, phone, email, training))
    }

    fn validate(name: &str, phone: &str, email: &str, training: &str) -> Result<(), StudentError> {
        if name.trim().is_empty() {
            return Err(StudentError::NameRequired);
        }
        if phone.trim().is_empty() {
            return Err(StudentError::PhoneRequired);
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(StudentError::EmailRequired);
        }
        if !email.contains('@') {
            return Err(StudentError::InvalidEmail(email.to_string()));
        }
        if training.trim().is_empty() {
            return Err(StudentError::TrainingRequired);
        }
        Ok(())
    }
}

/// Normalizes a free-form phone value into an international-prefixed digit
/// string. An 11-digit value is a Brazilian mobile number with area code
/// and gains the +55 prefix; anything else is kept as typed.
fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 {
        format!("+55{}", digits)
    } else {
        raw.trim().to_string()
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStatus {
    Active,
    Inactive,
    Planned,
}

impl TrainingStatus {
    pub fn from_arg(value: &str) -> Option<Self> {
        match value {
            "active" => Some(TrainingStatus::Active),
            "inactive" => Some(TrainingStatus::Inactive),
            "planned" => Some(TrainingStatus::Planned),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Training {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Denormalized count of students enrolled by training name; refreshed
    /// through [`Roster::refresh_training_counts`].
    pub students: usize,

    pub status: TrainingStatus,
    pub start_date: String,
    pub duration: String,
    pub instructor: String,
}

/// Mutable payload of a training, separate from its identity and its
/// derived student count.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingDetails {
    pub name: String,
    pub description: String,
    pub status: TrainingStatus,
    pub start_date: String,
    pub duration: String,
    pub instructor: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StudentAdded,
    StudentEdited,
    StudentDeleted,
    CsvImported,
    TrainingAdded,
    TrainingEdited,
    TrainingDeleted,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Activity {
    pub id: String,
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a committed import: how many records landed, where, and the
/// diagnostics for every row that was skipped.
#[derive(Debug)]
pub struct ImportSummary {
    pub imported: usize,
    pub training: String,
    errors: Vec<RowError>,
}

impl ImportSummary {
    /// Every row error accumulated during the pass.
    pub fn errors(&self) -> &[RowError] {
        &self.errors
    }

    /// The leading errors meant for display, capped at
    /// [`MAX_DISPLAYED_ERRORS`].
    pub fn displayed_errors(&self) -> &[RowError] {
        &self.errors[..self.errors.len().min(MAX_DISPLAYED_ERRORS)]
    }

    pub fn hidden_error_count(&self) -> usize {
        self.errors.len().saturating_sub(MAX_DISPLAYED_ERRORS)
    }
}

/// A Roster owns the student, training and activity collections and is
/// responsible for every mutation against them: manual CRUD, bulk CSV
/// import, and CSV export. Mutations persist through the store passed to
/// each operation, so the engine itself stays agnostic of where the data
/// lives.
#[derive(Default)]
pub struct Roster {
    students: Vec<StudentRecord>,
    trainings: Vec<Training>,
    activities: Vec<Activity>,

    /// Single-flight token: set for the duration of an import pass so a
    /// re-entrant import is rejected instead of interleaving.
    import_in_flight: bool,
}

impl Roster {
    /// Loads all collections from the given store.
    pub fn load_from<S: RosterStore + ?Sized>(store: &S) -> Result<Self, RosterError> {
        Ok(Self {
            students: store.load_students()?,
            trainings: store.load_trainings()?,
            activities: store.load_activities()?,
            import_in_flight: false,
        })
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn trainings(&self) -> &[Training] {
        &self.trainings
    }

    /// Activity log entries, newest first.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Runs the full import pipeline over decoded CSV text and commits the
    /// validated records.
    ///
    /// When no mapping is supplied the header row is auto-matched. Row
    /// failures are collected into the summary and never abort the pass;
    /// only file-level failures (undecodable text is rejected before this
    /// point, too few lines here) and an unresolved mapping do. With zero
    /// valid rows nothing is mutated or persisted and the summary reports
    /// 0 imported.
    pub fn import_csv<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        text: &str,
        mapping: Option<ColumnMapping>,
        training: &str,
    ) -> Result<ImportSummary, ImportError> {
        if self.import_in_flight {
            return Err(ImportError::InProgress);
        }

        // Hold the single-flight token for the whole pass, releasing it on
        // every exit path.
        self.import_in_flight = true;
        let result = self.run_import(store, text, mapping, training);
        self.import_in_flight = false;

        result
    }

    fn run_import<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        text: &str,
        mapping: Option<ColumnMapping>,
        training: &str,
    ) -> Result<ImportSummary, ImportError> {
        let lines = import::split_lines(text);
        if lines.len() < 2 {
            return Err(ImportFileError::NotEnoughLines(lines.len()).into());
        }

        let mapping = mapping.unwrap_or_else(|| {
            ColumnMapping::detect(&import::tokenize_line(lines[0]))
        });
        let mapped = import::map_rows(&lines, &mapping, training)?;

        for error in &mapped.errors {
            warn!("skipping row: {}", error);
        }

        let imported = mapped.records.len();
        if imported > 0 {
            self.students.extend(mapped.records);
            store.save_students(&self.students)?;
            self.record_activity(
                store,
                ActivityKind::CsvImported,
                format!("{} students imported into {}", imported, training),
            )?;
        }

        if !is_canonical_training(training) {
            info!("imported into custom training {:?}", training);
        }
        info!(
            "import finished: {} records imported, {} rows skipped",
            imported,
            mapped.errors.len()
        );

        Ok(ImportSummary {
            imported,
            training: training.to_string(),
            errors: mapped.errors,
        })
    }

    /// Generates the CSV export of the current student collection: the
    /// fixed header followed by one line per record with every field
    /// quoted. Embedded quotes are escaped by doubling, so the output
    /// re-imports cleanly.
    pub fn export_csv(&self) -> Result<String, ExportError> {
        let mut buf = Vec::new();
        {
            // The header is written by hand because the writer would quote
            // it like the data rows, and the export format keeps its header
            // bare.
            let mut wtr = csv::WriterBuilder::new()
                .quote_style(QuoteStyle::Always)
                .has_headers(false)
                .from_writer(&mut buf);

            for student in &self.students {
                wtr.serialize(ExportRow {
                    name: &student.name,
                    phone: &student.phone,
                    email: &student.email,
                    training: &student.training,
                })?;
            }

            let _ = wtr.flush();
        }

        let body = String::from_utf8(buf)?;
        Ok(format!("{}\n{}", EXPORT_HEADER, body))
    }

    /// Validates, normalizes and appends a manually entered student.
    pub fn add_student<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        phone: &str,
        email: &str,
        training: &str,
    ) -> Result<StudentRecord, RosterError> {
        let student = StudentRecord::create(name, phone, email, training)?;

        self.students.push(student.clone());
        store.save_students(&self.students)?;
        self.record_activity(
            store,
            ActivityKind::StudentAdded,
            format!("student {} added", student.name),
        )?;

        Ok(student)
    }

    /// Overwrites a student's payload fields in place, preserving its id.
    pub fn edit_student<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        id: &str,
        name: &str,
        phone: &str,
        email: &str,
        training: &str,
    ) -> Result<StudentRecord, RosterError> {
        let position = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| RosterError::NoSuchStudent(id.to_string()))?;

        let mut updated = StudentRecord::create(name, phone, email, training)?;
        updated.id = self.students[position].id.clone();
        self.students[position] = updated.clone();

        store.save_students(&self.students)?;
        self.record_activity(
            store,
            ActivityKind::StudentEdited,
            format!("student {} edited", updated.name),
        )?;

        Ok(updated)
    }

    /// Deletes a student by id. There is no soft-delete and no history.
    pub fn remove_student<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        id: &str,
    ) -> Result<StudentRecord, RosterError> {
        let position = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| RosterError::NoSuchStudent(id.to_string()))?;

        let removed = self.students.remove(position);
        store.save_students(&self.students)?;
        self.record_activity(
            store,
            ActivityKind::StudentDeleted,
            format!("student {} removed", removed.name),
        )?;

        Ok(removed)
    }

    pub fn add_training<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        details: TrainingDetails,
    ) -> Result<Training, RosterError> {
        let training = Training {
            id: Uuid::new_v4().to_string(),
            name: details.name,
            description: details.description,
            students: 0,
            status: details.status,
            start_date: details.start_date,
            duration: details.duration,
            instructor: details.instructor,
        };

        self.trainings.push(training.clone());
        store.save_trainings(&self.trainings)?;
        self.record_activity(
            store,
            ActivityKind::TrainingAdded,
            format!("training {} added", training.name),
        )?;

        Ok(training)
    }

    /// Overwrites a training's payload in place, preserving its id and its
    /// derived student count.
    pub fn edit_training<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        id: &str,
        details: TrainingDetails,
    ) -> Result<Training, RosterError> {
        let position = self
            .trainings
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| RosterError::NoSuchTraining(id.to_string()))?;

        {
            let training = &mut self.trainings[position];
            training.name = details.name;
            training.description = details.description;
            training.status = details.status;
            training.start_date = details.start_date;
            training.duration = details.duration;
            training.instructor = details.instructor;
        }
        let updated = self.trainings[position].clone();

        store.save_trainings(&self.trainings)?;
        self.record_activity(
            store,
            ActivityKind::TrainingEdited,
            format!("training {} edited", updated.name),
        )?;

        Ok(updated)
    }

    pub fn remove_training<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        id: &str,
    ) -> Result<Training, RosterError> {
        let position = self
            .trainings
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| RosterError::NoSuchTraining(id.to_string()))?;

        let removed = self.trainings.remove(position);
        store.save_trainings(&self.trainings)?;
        self.record_activity(
            store,
            ActivityKind::TrainingDeleted,
            format!("training {} removed", removed.name),
        )?;

        Ok(removed)
    }

    /// Recomputes each training's student count from the student collection
    /// by exact training-name match.
    pub fn refresh_training_counts<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<(), RosterError> {
        for training in &mut self.trainings {
            training.students = self
                .students
                .iter()
                .filter(|s| s.training == training.name)
                .count();
        }
        store.save_trainings(&self.trainings)?;

        Ok(())
    }

    fn record_activity<S: RosterStore + ?Sized>(
        &mut self,
        store: &S,
        kind: ActivityKind,
        message: String,
    ) -> Result<(), StoreError> {
        let activity = Activity {
            id: Uuid::new_v4().to_string(),
            kind,
            message,
            timestamp: Utc::now(),
        };

        self.activities.insert(0, activity);
        self.activities.truncate(ACTIVITY_LOG_CAP);
        store.save_activities(&self.activities)?;

        Ok(())
    }
}

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Nome")]
    name: &'a str,
    #[serde(rename = "Celular")]
    phone: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Treinamento")]
    training: &'a str,
}

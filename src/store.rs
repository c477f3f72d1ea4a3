use crate::errors::StoreError;
use crate::roster::{Activity, StudentRecord, Training};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

const STUDENTS_FILE: &str = "students.json";
const TRAININGS_FILE: &str = "trainings.json";
const ACTIVITIES_FILE: &str = "activities.json";

/// The persistence boundary of the roster engine: a load/save pair per
/// collection. The engine neither knows nor cares whether an
/// implementation is durable; every save is last-write-wins over the whole
/// collection.
pub trait RosterStore {
    fn load_students(&self) -> Result<Vec<StudentRecord>, StoreError>;
    fn save_students(&self, students: &[StudentRecord]) -> Result<(), StoreError>;

    fn load_trainings(&self) -> Result<Vec<Training>, StoreError>;
    fn save_trainings(&self, trainings: &[Training]) -> Result<(), StoreError>;

    fn load_activities(&self) -> Result<Vec<Activity>, StoreError>;
    fn save_activities(&self, activities: &[Activity]) -> Result<(), StoreError>;
}

/// Durable store keeping one JSON file per collection under a data
/// directory. A collection whose file does not exist yet loads as empty.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Opens a store rooted at the given directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StoreError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write<T: Serialize>(&self, file: &str, values: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(values)?;
        fs::write(self.dir.join(file), json)?;
        Ok(())
    }
}

impl RosterStore for JsonStore {
    fn load_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        self.read(STUDENTS_FILE)
    }

    fn save_students(&self, students: &[StudentRecord]) -> Result<(), StoreError> {
        self.write(STUDENTS_FILE, students)
    }

    fn load_trainings(&self) -> Result<Vec<Training>, StoreError> {
        self.read(TRAININGS_FILE)
    }

    fn save_trainings(&self, trainings: &[Training]) -> Result<(), StoreError> {
        self.write(TRAININGS_FILE, trainings)
    }

    fn load_activities(&self) -> Result<Vec<Activity>, StoreError> {
        self.read(ACTIVITIES_FILE)
    }

    fn save_activities(&self, activities: &[Activity]) -> Result<(), StoreError> {
        self.write(ACTIVITIES_FILE, activities)
    }
}

/// Volatile store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    students: RefCell<Vec<StudentRecord>>,
    trainings: RefCell<Vec<Training>>,
    activities: RefCell<Vec<Activity>>,
}

impl RosterStore for MemoryStore {
    fn load_students(&self) -> Result<Vec<StudentRecord>, StoreError> {
        Ok(self.students.borrow().clone())
    }

    fn save_students(&self, students: &[StudentRecord]) -> Result<(), StoreError> {
        *self.students.borrow_mut() = students.to_vec();
        Ok(())
    }

    fn load_trainings(&self) -> Result<Vec<Training>, StoreError> {
        Ok(self.trainings.borrow().clone())
    }

    fn save_trainings(&self, trainings: &[Training]) -> Result<(), StoreError> {
        *self.trainings.borrow_mut() = trainings.to_vec();
        Ok(())
    }

    fn load_activities(&self) -> Result<Vec<Activity>, StoreError> {
        Ok(self.activities.borrow().clone())
    }

    fn save_activities(&self, activities: &[Activity]) -> Result<(), StoreError> {
        *self.activities.borrow_mut() = activities.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::TrainingStatus;

    fn student(name: &str) -> StudentRecord {
        StudentRecord::create(name, "11988887777", "a@example.com", "ASBIE").unwrap()
    }

    #[test]
    fn should_load_empty_collections_from_a_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("roster")).unwrap();

        assert!(store.load_students().unwrap().is_empty());
        assert!(store.load_trainings().unwrap().is_empty());
        assert!(store.load_activities().unwrap().is_empty());
    }

    #[test]
    fn should_round_trip_students_through_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let students = vec![student("Ana"), student("Beto")];
        store.save_students(&students).unwrap();

        // Re-open the store to prove the data came back from disk, not
        // from memory.
        let reopened = JsonStore::open(dir.path()).unwrap();
        assert_eq!(reopened.load_students().unwrap(), students);
    }

    #[test]
    fn should_round_trip_trainings_through_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let trainings = vec![Training {
            id: "t-1".to_string(),
            name: "SBIE Care".to_string(),
            description: "care program".to_string(),
            students: 12,
            status: TrainingStatus::Planned,
            start_date: "2024-05-01".to_string(),
            duration: "6 weeks".to_string(),
            instructor: "Marina".to_string(),
        }];
        store.save_trainings(&trainings).unwrap();
        assert_eq!(store.load_trainings().unwrap(), trainings);
    }

    #[test]
    fn should_overwrite_the_whole_collection_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        store.save_students(&[student("Ana"), student("Beto")]).unwrap();
        let survivor = vec![student("Carla")];
        store.save_students(&survivor).unwrap();

        assert_eq!(store.load_students().unwrap(), survivor);
    }

    #[test]
    fn should_round_trip_collections_through_the_memory_store() {
        let store = MemoryStore::default();
        let students = vec![student("Ana")];
        store.save_students(&students).unwrap();
        assert_eq!(store.load_students().unwrap(), students);
    }
}

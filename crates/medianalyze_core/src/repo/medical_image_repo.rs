//! Medical image metadata repository.
//!
//! # Invariants
//! - Image rows reference an existing patient at insert time.
//! - `original_filename` falls back to `filename` when not supplied.

use crate::model::medical_image::{ImageId, MedicalImage, MedicalImageUpdate, NewMedicalImage};
use crate::model::patient::PatientId;
use crate::model::validation::ValidationError;
use crate::repo::patient_repo::patient_exists;
use crate::repo::{
    ensure_schema_ready, ColumnUpdates, EntityKind, ListFilter, RepoError, RepoResult,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite::{Transaction, TransactionBehavior};

const IMAGE_SELECT_SQL: &str = "SELECT
    image_id,
    patient_id,
    filename,
    image_path,
    image_type,
    processing_method,
    original_filename,
    file_size,
    width,
    height,
    notes,
    uploaded_at
FROM medical_images";

/// Filter options for listing image metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicalImageQuery {
    pub image_id: Option<ImageId>,
    pub patient_id: Option<PatientId>,
    pub image_type: Option<String>,
    pub processing_method: Option<String>,
    pub limit: Option<u32>,
}

/// Repository interface for image metadata CRUD operations.
pub trait MedicalImageRepository {
    fn insert_image(&self, image: &NewMedicalImage) -> RepoResult<MedicalImage>;
    fn get_image(&self, id: ImageId) -> RepoResult<Option<MedicalImage>>;
    fn list_images(&self, query: &MedicalImageQuery) -> RepoResult<Vec<MedicalImage>>;
    fn update_image(&self, id: ImageId, update: &MedicalImageUpdate) -> RepoResult<MedicalImage>;
    fn delete_image(&self, id: ImageId) -> RepoResult<bool>;
}

/// SQLite-backed image metadata repository.
pub struct SqliteMedicalImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMedicalImageRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MedicalImageRepository for SqliteMedicalImageRepository<'_> {
    fn insert_image(&self, image: &NewMedicalImage) -> RepoResult<MedicalImage> {
        image.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !patient_exists(&tx, image.patient_id)? {
            return Err(ValidationError::MissingPatient(image.patient_id).into());
        }

        tx.execute(
            "INSERT INTO medical_images (
                patient_id,
                filename,
                image_path,
                image_type,
                processing_method,
                original_filename,
                file_size,
                width,
                height,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                image.patient_id,
                image.filename.as_str(),
                image.image_path.as_str(),
                image.image_type.as_deref(),
                image.processing_method.as_deref(),
                image
                    .original_filename
                    .as_deref()
                    .unwrap_or(image.filename.as_str()),
                image.file_size,
                image.width,
                image.height,
                image.notes.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        let created = load_image(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("medical image {id} missing right after insert"))
        })?;
        tx.commit()?;

        Ok(created)
    }

    fn get_image(&self, id: ImageId) -> RepoResult<Option<MedicalImage>> {
        load_image(self.conn, id)
    }

    fn list_images(&self, query: &MedicalImageQuery) -> RepoResult<Vec<MedicalImage>> {
        let mut filter = ListFilter::new(IMAGE_SELECT_SQL);
        filter.push_opt("image_id = ?", query.image_id);
        filter.push_opt("patient_id = ?", query.patient_id);
        filter.push_opt("image_type = ?", query.image_type.clone());
        filter.push_opt("processing_method = ?", query.processing_method.clone());
        let (sql, values) = filter.finish("uploaded_at DESC, image_id DESC", query.limit);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut images = Vec::new();
        while let Some(row) = rows.next()? {
            images.push(parse_image_row(row)?);
        }

        Ok(images)
    }

    fn update_image(&self, id: ImageId, update: &MedicalImageUpdate) -> RepoResult<MedicalImage> {
        update.validate()?;

        let mut columns = ColumnUpdates::new();
        columns.set_opt("filename", update.filename.clone());
        columns.set_opt("image_path", update.image_path.clone());
        columns.set_opt("image_type", update.image_type.clone());
        columns.set_opt("processing_method", update.processing_method.clone());
        columns.set_opt("file_size", update.file_size);
        columns.set_opt("width", update.width);
        columns.set_opt("height", update.height);
        columns.set_opt("notes", update.notes.clone());

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !columns.is_empty() {
            let (sql, values) = columns.into_sql("medical_images", "image_id", id);
            if tx.execute(&sql, params_from_iter(values))? == 0 {
                return Err(not_found(id));
            }
        }

        let updated = load_image(&tx, id)?.ok_or_else(|| not_found(id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_image(&self, id: ImageId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM medical_images WHERE image_id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn load_image(conn: &Connection, id: ImageId) -> RepoResult<Option<MedicalImage>> {
    let mut stmt = conn.prepare(&format!("{IMAGE_SELECT_SQL} WHERE image_id = ?1;"))?;
    let image = stmt.query_row([id], parse_image_row).optional()?;
    Ok(image)
}

fn parse_image_row(row: &Row<'_>) -> rusqlite::Result<MedicalImage> {
    Ok(MedicalImage {
        image_id: row.get("image_id")?,
        patient_id: row.get("patient_id")?,
        filename: row.get("filename")?,
        image_path: row.get("image_path")?,
        image_type: row.get("image_type")?,
        processing_method: row.get("processing_method")?,
        original_filename: row.get("original_filename")?,
        file_size: row.get("file_size")?,
        width: row.get("width")?,
        height: row.get("height")?,
        notes: row.get("notes")?,
        uploaded_at: row.get("uploaded_at")?,
    })
}

fn not_found(id: ImageId) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::MedicalImage,
        id,
    }
}

//! Reading multipart form submissions and applying their attachment changes.

use axum::{body::Bytes, extract::Multipart, extract::multipart::Field as MultipartField};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error,
    documents::{
        AttachmentMatch, AttachmentOwner, MAX_UPLOAD_SIZE, MediaStorage, attach,
        create_attachment, delete_orphaned_attachments, remove_attachment_match,
    },
    endpoints,
    form::{FormData, FormErrors, INVALID_CHOICE_MESSAGE},
    html::{FIELDSET_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, field_errors},
};

pub const NEW_FILES_FIELD: &str = "newattachment-attachment_files";
const MATCH_PREFIX: &str = "attachmentmatch_set";

/// A file part of a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub bytes: Bytes,
}

/// A decoded multipart submission, text fields and files separated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub data: FormData,
    pub files: Vec<UploadedFile>,
}

/// Read every part of a multipart request.
///
/// File inputs left empty by the browser are skipped.
pub async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm, Error> {
    let mut pairs = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .inspect_err(|error| tracing::error!("Failed to read multipart field: {error}"))
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        match field.file_name().map(str::to_owned) {
            Some(file_name) => {
                let bytes = read_bytes(field).await?;

                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                files.push(UploadedFile {
                    field: name,
                    file_name,
                    bytes,
                });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|error| Error::MultipartError(error.to_string()))?;
                pairs.push((name, value));
            }
        }
    }

    Ok(MultipartForm {
        data: FormData::new(pairs),
        files,
    })
}

async fn read_bytes(field: MultipartField<'_>) -> Result<Bytes, Error> {
    field
        .bytes()
        .await
        .inspect_err(|error| tracing::error!("Failed to read uploaded file: {error}"))
        .map_err(|error| Error::MultipartError(error.to_string()))
}

/// The attachment changes requested by a form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentChanges {
    pub new_files: Vec<UploadedFile>,
    pub removed_matches: Vec<i64>,
}

/// Validate the uploaded files and the attachment matches marked for
/// deletion.
///
/// `existing` are the matches of the record being edited, empty for new
/// records.
pub fn read_attachment_changes(
    form: &MultipartForm,
    max_files: usize,
    existing: &[AttachmentMatch],
    errors: &mut FormErrors,
) -> AttachmentChanges {
    let new_files: Vec<UploadedFile> = form
        .files
        .iter()
        .filter(|file| file.field == NEW_FILES_FIELD)
        .cloned()
        .collect();

    if new_files.len() > max_files {
        errors.add(
            NEW_FILES_FIELD,
            format!(
                "Ensure at most {max_files} files are uploaded (received {}).",
                new_files.len()
            ),
        );
    }

    for file in &new_files {
        if file.bytes.len() > MAX_UPLOAD_SIZE {
            errors.add(
                NEW_FILES_FIELD,
                format!("File {} exceeded maximum upload size.", file.file_name),
            );
        }
    }

    let mut removed_matches = Vec::new();

    for index in form.data.indices(MATCH_PREFIX) {
        let prefix = format!("{MATCH_PREFIX}-{index}");

        if !form.data.checkbox(&format!("{prefix}-DELETE")) {
            continue;
        }

        let id_field = format!("{prefix}-id");
        match form.data.text(&id_field).parse::<i64>() {
            Ok(id) if existing.iter().any(|existing| existing.id == id) => {
                removed_matches.push(id)
            }
            _ => errors.add(&id_field, INVALID_CHOICE_MESSAGE),
        }
    }

    AttachmentChanges {
        new_files,
        removed_matches,
    }
}

/// The files written and released while saving a form.
///
/// Database changes are made in a transaction, files are not, so once the
/// transaction has finished either [FileChanges::commit] or
/// [FileChanges::rollback] must be called.
#[derive(Debug, Default)]
pub struct FileChanges {
    saved: Vec<String>,
    released: Vec<String>,
}

impl FileChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record files whose attachment rows were deleted.
    pub fn release(&mut self, locations: impl IntoIterator<Item = String>) {
        self.released.extend(locations);
    }

    /// Remove the released files after the transaction committed.
    pub fn commit(self, storage: &MediaStorage) {
        for location in &self.released {
            storage.remove(location);
        }
    }

    /// Remove the newly saved files after the transaction failed.
    pub fn rollback(self, storage: &MediaStorage) {
        for location in &self.saved {
            storage.remove(location);
        }
    }
}

/// Run `save` and then commit or roll back the file changes it made,
/// depending on whether it succeeded.
pub fn with_file_changes<T>(
    storage: &MediaStorage,
    save: impl FnOnce(&mut FileChanges) -> Result<T, Error>,
) -> Result<T, Error> {
    let mut file_changes = FileChanges::new();

    match save(&mut file_changes) {
        Ok(value) => {
            file_changes.commit(storage);
            Ok(value)
        }
        Err(error) => {
            file_changes.rollback(storage);
            Err(error)
        }
    }
}

/// Save new files, link them to `owner` and remove the matches marked for
/// deletion.
///
/// Attachments left without any match are deleted and their files released.
pub fn apply_attachment_changes(
    owner: AttachmentOwner,
    changes: &AttachmentChanges,
    storage: &MediaStorage,
    file_changes: &mut FileChanges,
    connection: &Connection,
) -> Result<(), Error> {
    for file in &changes.new_files {
        let location = storage.save(&file.file_name, &file.bytes)?;
        file_changes.saved.push(location.clone());

        let attachment = create_attachment(&location, connection)?;
        attach(owner, attachment.id, connection)?;
    }

    for match_id in &changes.removed_matches {
        remove_attachment_match(owner, *match_id, connection)?;
    }

    let orphans = delete_orphaned_attachments(connection)?;
    file_changes.release(orphans.into_iter().map(|attachment| attachment.location));

    Ok(())
}

/// The existing attachments of a record and a file input for new ones.
pub fn attachment_fields(
    matches: &[AttachmentMatch],
    data: &FormData,
    errors: &FormErrors,
) -> Markup {
    html! {
        fieldset class=(FIELDSET_STYLE)
        {
            legend class=(FORM_LABEL_STYLE) { "Attachments" }

            @for (index, attachment_match) in matches.iter().enumerate() {
                @let prefix = format!("{MATCH_PREFIX}-{index}");
                @let delete_name = format!("{prefix}-DELETE");
                @let id_name = format!("{prefix}-id");

                div class="flex items-center justify-between gap-4"
                {
                    a
                        href=(endpoints::format_endpoint(endpoints::ATTACHMENT, attachment_match.attachment.id))
                        class=(LINK_STYLE)
                    {
                        (attachment_match.attachment)
                    }

                    input type="hidden" name=(id_name) value=(attachment_match.id);

                    label class="flex items-center gap-x-2 text-sm"
                    {
                        input type="checkbox" name=(delete_name) checked[data.checkbox(&delete_name)];
                        "Remove"
                    }
                }

                (field_errors(errors.field(&id_name)))
            }

            div
            {
                label for=(NEW_FILES_FIELD) class=(FORM_LABEL_STYLE) { "Add files" }

                input
                    id=(NEW_FILES_FIELD)
                    type="file"
                    name=(NEW_FILES_FIELD)
                    multiple
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_errors(errors.field(NEW_FILES_FIELD)))
            }
        }
    }
}


#[cfg(test)]
mod apply_attachment_changes_tests {
    use axum::body::Bytes;
    use tempfile::TempDir;

    use crate::{
        Error,
        documents::{
            AttachmentOwner, MediaStorage, get_attachment, get_attachment_matches,
        },
        test_utils::{fixtures, get_test_connection},
    };

    use super::{
        AttachmentChanges, FileChanges, NEW_FILES_FIELD, UploadedFile, apply_attachment_changes,
    };

    fn upload(name: &str) -> UploadedFile {
        UploadedFile {
            field: NEW_FILES_FIELD.to_owned(),
            file_name: name.to_owned(),
            bytes: Bytes::from_static(b"data"),
        }
    }

    #[tokio::test]
    async fn saves_files_and_links_them() {
        let media_root = TempDir::new().unwrap();
        let storage = MediaStorage::new(media_root.path());
        let connection = get_test_connection();
        let statement = fixtures::statement(&connection);
        let owner = AttachmentOwner::Statement(statement.id);
        let mut file_changes = FileChanges::new();

        apply_attachment_changes(
            owner,
            &AttachmentChanges {
                new_files: vec![upload("a.pdf")],
                removed_matches: Vec::new(),
            },
            &storage,
            &mut file_changes,
            &connection,
        )
        .unwrap();
        file_changes.commit(&storage);

        let matches = get_attachment_matches(owner, &connection).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].attachment.file_name(), "a.pdf");
        assert_eq!(
            storage.read(&matches[0].attachment.location).await.unwrap(),
            b"data"
        );
    }

    #[tokio::test]
    async fn removed_matches_release_their_files() {
        let media_root = TempDir::new().unwrap();
        let storage = MediaStorage::new(media_root.path());
        let connection = get_test_connection();
        let statement = fixtures::statement(&connection);
        let owner = AttachmentOwner::Statement(statement.id);
        let mut file_changes = FileChanges::new();
        apply_attachment_changes(
            owner,
            &AttachmentChanges {
                new_files: vec![upload("a.pdf")],
                removed_matches: Vec::new(),
            },
            &storage,
            &mut file_changes,
            &connection,
        )
        .unwrap();
        file_changes.commit(&storage);
        let existing = get_attachment_matches(owner, &connection).unwrap().remove(0);

        let mut file_changes = FileChanges::new();
        apply_attachment_changes(
            owner,
            &AttachmentChanges {
                new_files: Vec::new(),
                removed_matches: vec![existing.id],
            },
            &storage,
            &mut file_changes,
            &connection,
        )
        .unwrap();
        file_changes.commit(&storage);

        assert!(get_attachment_matches(owner, &connection).unwrap().is_empty());
        assert_eq!(
            get_attachment(existing.attachment.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            storage.read(&existing.attachment.location).await,
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn rollback_removes_saved_files() {
        let media_root = TempDir::new().unwrap();
        let storage = MediaStorage::new(media_root.path());
        let connection = get_test_connection();
        let statement = fixtures::statement(&connection);
        let mut file_changes = FileChanges::new();

        apply_attachment_changes(
            AttachmentOwner::Statement(statement.id),
            &AttachmentChanges {
                new_files: vec![upload("a.pdf")],
                removed_matches: Vec::new(),
            },
            &storage,
            &mut file_changes,
            &connection,
        )
        .unwrap();
        let location = file_changes.saved[0].clone();
        file_changes.rollback(&storage);

        assert_eq!(storage.read(&location).await, Err(Error::NotFound));
    }
}

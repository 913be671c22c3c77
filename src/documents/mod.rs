//! File attachments for statements and financial transactions.

mod db;
mod domain;
mod download;
mod storage;
mod upload;

pub use db::{
    attach, create_attachment, create_attachment_tables, delete_orphaned_attachments,
    get_attachment, get_attachment_matches, remove_attachment_match,
};
pub use domain::{Attachment, AttachmentId, AttachmentMatch, AttachmentOwner};
pub use download::get_attachment_file;
pub use storage::{MAX_UPLOAD_SIZE, MediaStorage};
pub use upload::{
    AttachmentChanges, FileChanges, MultipartForm, apply_attachment_changes, attachment_fields,
    read_attachment_changes, read_multipart, with_file_changes,
};

#[cfg(test)]
pub use upload::{NEW_FILES_FIELD, UploadedFile};

//! File storage for HackPortal.
//!
//! Uploads applicant files (resumes and similar) to Google Drive using a
//! service account, and hands back a public link for each stored file.
//!
//! # Modules
//!
//! - `storage` - Drive uploader, service-account credentials and tokens

pub mod storage;

//! Completion notices and the copy jobs built from them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AdmissionError, AdmissionResult};

/// Longest accepted content identifier, in bytes.
const MAX_IDENTIFIER_LEN: usize = 255;

/// Inbound fact asserted by a caller: a payload finished downloading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionNotice {
    /// Opaque content identifier, used as the path segment under both roots.
    pub metainfo: String,
    /// Human-readable name, informational only.
    pub name: String,
    /// State label reported by the caller, informational only.
    pub state: String,
    /// Time at which the caller observed completion.
    pub time: DateTime<Utc>,
}

/// Filesystem roots that jobs resolve their paths against.
#[derive(Debug, Clone)]
pub struct CopyRoots {
    /// Staging root payloads are read from.
    pub source_root: PathBuf,
    /// Library root payloads are copied into.
    pub library_root: PathBuf,
}

/// A queued unit of work: one notice resolved against the configured roots.
///
/// Owned exclusively by whichever consumer dequeues it; dropped once the
/// worker has reported an outcome for it.
#[derive(Debug, Clone)]
pub struct CopyJob {
    /// Correlation id assigned at admission.
    pub notice_id: Uuid,
    /// The originating notice.
    pub notice: CompletionNotice,
    /// Absolute directory the payload is read from.
    pub source: PathBuf,
    /// Absolute directory the payload is copied into.
    pub destination: PathBuf,
}

impl CopyJob {
    /// Validate the notice's identifier and resolve the job paths.
    ///
    /// The identifier is untrusted input interpolated into filesystem paths,
    /// so it is constrained to a safe character set and checked for dot
    /// segments before any path is constructed.
    ///
    /// # Errors
    ///
    /// Returns an [`AdmissionError`] if the identifier is empty, too long,
    /// a dot segment, or contains characters outside `[A-Za-z0-9._-]`.
    pub fn build(notice: CompletionNotice, roots: &CopyRoots) -> AdmissionResult<Self> {
        validate_identifier(&notice.metainfo)?;
        let source = roots.source_root.join(&notice.metainfo);
        let destination = roots.library_root.join(&notice.metainfo);
        Ok(Self {
            notice_id: Uuid::new_v4(),
            notice,
            source,
            destination,
        })
    }

    /// Content identifier this job is keyed on.
    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.notice.metainfo
    }
}

fn validate_identifier(identifier: &str) -> AdmissionResult<()> {
    if identifier.is_empty() {
        return Err(AdmissionError::EmptyIdentifier);
    }
    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(AdmissionError::UnsafeIdentifier {
            value: identifier.to_string(),
            reason: "too_long",
        });
    }
    if identifier == "." || identifier == ".." {
        return Err(AdmissionError::UnsafeIdentifier {
            value: identifier.to_string(),
            reason: "dot_segment",
        });
    }
    let safe = identifier
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-'));
    if !safe {
        return Err(AdmissionError::UnsafeIdentifier {
            value: identifier.to_string(),
            reason: "invalid_character",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn sample_notice(metainfo: &str) -> CompletionNotice {
        CompletionNotice {
            metainfo: metainfo.to_string(),
            name: "Some.Release".to_string(),
            state: "done".to_string(),
            time: Utc::now(),
        }
    }

    fn sample_roots() -> CopyRoots {
        CopyRoots {
            source_root: PathBuf::from("/data/torrents"),
            library_root: PathBuf::from("/data/complete"),
        }
    }

    #[test]
    fn build_resolves_paths_under_both_roots() -> AdmissionResult<()> {
        let job = CopyJob::build(sample_notice("abc123"), &sample_roots())?;
        assert_eq!(job.source, Path::new("/data/torrents/abc123"));
        assert_eq!(job.destination, Path::new("/data/complete/abc123"));
        assert_eq!(job.content_id(), "abc123");
        Ok(())
    }

    #[test]
    fn empty_identifier_is_rejected() {
        let err = CopyJob::build(sample_notice(""), &sample_roots())
            .expect_err("empty identifier must not build a job");
        assert_eq!(err, AdmissionError::EmptyIdentifier);
    }

    #[test]
    fn traversal_attempts_are_rejected() {
        for identifier in ["..", ".", "../../etc", "a/b", "a\\b", "a b", "hash\u{0}"] {
            let err = CopyJob::build(sample_notice(identifier), &sample_roots())
                .expect_err("unsafe identifier must not build a job");
            assert!(
                matches!(err, AdmissionError::UnsafeIdentifier { .. }),
                "identifier {identifier:?} should be unsafe"
            );
        }
    }

    #[test]
    fn overlong_identifier_is_rejected() {
        let identifier = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        let err = CopyJob::build(sample_notice(&identifier), &sample_roots())
            .expect_err("overlong identifier must not build a job");
        assert!(matches!(
            err,
            AdmissionError::UnsafeIdentifier {
                reason: "too_long",
                ..
            }
        ));
    }

    #[test]
    fn dotted_but_safe_identifiers_are_accepted() {
        let roots = sample_roots();
        for identifier in ["abc.def", "a-b_c", "ABC123", "v1.2.3-rc.1"] {
            assert!(
                CopyJob::build(sample_notice(identifier), &roots).is_ok(),
                "identifier {identifier:?} should be accepted"
            );
        }
    }
}

//! Image reference classification
//!
//! Turns a raw destination from an untrusted document into an
//! [`ImageSource`]. Absolute and document-relative references keep their
//! explicit path semantics and are checked by the sandbox at read time.
//! Sidecar lookups happen implicitly on the user's behalf, so their names are
//! screened here before any filesystem access.

use crate::markdown::parse_destination;
use crate::sandbox::{clean_path, SidecarLocator};
use crate::types::ImageSource;
use std::path::Path;
use tracing::debug;

/// Classify a raw image destination. First match wins:
/// remote URL, absolute path, document-relative path, sidecar filename.
pub fn classify(
    raw: &str,
    document_location: Option<&Path>,
    sidecar_lookup: Option<&dyn SidecarLocator>,
) -> ImageSource {
    let cleaned = parse_destination(raw);

    if has_prefix_ignore_case(&cleaned, "http://") || has_prefix_ignore_case(&cleaned, "https://")
    {
        return ImageSource::Remote { url: cleaned };
    }

    if cleaned.starts_with('/') {
        return ImageSource::Absolute {
            path: cleaned.into(),
        };
    }

    if cleaned.starts_with("./") || cleaned.starts_with("../") {
        if let Some(base) = document_location.and_then(Path::parent) {
            return ImageSource::DocumentRelative {
                path: clean_path(&base.join(&cleaned)),
            };
        }
    }

    let name = cleaned.trim().to_string();
    if !is_safe_sidecar_name(&name) {
        debug!("Unsafe sidecar reference {:?}", name);
        return ImageSource::Sidecar {
            name,
            resolved: None,
        };
    }

    let resolved = sidecar_lookup.and_then(|lookup| lookup.exists(&name));
    ImageSource::Sidecar { name, resolved }
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn is_safe_sidecar_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('\0')
        && !name.contains("..")
        && !name.contains("//")
        && !name.contains("\\\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct MapLocator {
        files: HashMap<String, PathBuf>,
        calls: Cell<usize>,
    }

    impl MapLocator {
        fn with(names: &[&str]) -> Self {
            Self {
                files: names
                    .iter()
                    .map(|n| (n.to_string(), PathBuf::from("/sidecar").join(n)))
                    .collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl SidecarLocator for MapLocator {
        fn exists(&self, name: &str) -> Option<PathBuf> {
            self.calls.set(self.calls.get() + 1);
            self.files.get(name).cloned()
        }
    }

    fn doc() -> &'static Path {
        Path::new("/docs/note.md")
    }

    #[test]
    fn test_remote() {
        assert_eq!(
            classify("https://x/a.png", None, None),
            ImageSource::Remote {
                url: "https://x/a.png".into()
            }
        );
        assert!(matches!(
            classify("HTTP://EXAMPLE.COM/A.PNG", Some(doc()), None),
            ImageSource::Remote { .. }
        ));
        // not a scheme prefix
        assert!(matches!(
            classify("httpx.png", None, None),
            ImageSource::Sidecar { .. }
        ));
    }

    #[test]
    fn test_absolute() {
        assert_eq!(
            classify("/a/b.png", Some(doc()), None),
            ImageSource::Absolute {
                path: "/a/b.png".into()
            }
        );
    }

    #[test]
    fn test_document_relative() {
        assert_eq!(
            classify("./x.png", Some(doc()), None),
            ImageSource::DocumentRelative {
                path: "/docs/x.png".into()
            }
        );
        assert_eq!(
            classify("../shared/x.png", Some(doc()), None),
            ImageSource::DocumentRelative {
                path: "/shared/x.png".into()
            }
        );
    }

    #[test]
    fn test_bracketed_relative_with_space() {
        assert_eq!(
            classify("<./my file.png>", Some(doc()), None),
            ImageSource::DocumentRelative {
                path: "/docs/my file.png".into()
            }
        );
    }

    #[test]
    fn test_relative_without_document_falls_through() {
        assert_eq!(
            classify("./x.png", None, None),
            ImageSource::Sidecar {
                name: "./x.png".into(),
                resolved: None
            }
        );
        let traversal = MapLocator::with(&["../x.png"]);
        assert_eq!(
            classify("../x.png", None, Some(&traversal)),
            ImageSource::Sidecar {
                name: "../x.png".into(),
                resolved: None
            }
        );
        assert_eq!(traversal.calls.get(), 0);
    }

    #[test]
    fn test_sidecar_resolved() {
        let lookup = MapLocator::with(&["photo.png"]);
        assert_eq!(
            classify("photo.png", Some(doc()), Some(&lookup)),
            ImageSource::Sidecar {
                name: "photo.png".into(),
                resolved: Some("/sidecar/photo.png".into())
            }
        );
        assert_eq!(lookup.calls.get(), 1);
    }

    #[test]
    fn test_sidecar_unresolved() {
        let lookup = MapLocator::with(&[]);
        assert_eq!(
            classify("photo.png", Some(doc()), Some(&lookup)),
            ImageSource::Sidecar {
                name: "photo.png".into(),
                resolved: None
            }
        );
        assert_eq!(
            classify("photo.png", Some(doc()), None),
            ImageSource::Sidecar {
                name: "photo.png".into(),
                resolved: None
            }
        );
    }

    #[test]
    fn test_unsafe_sidecar_names_skip_lookup() {
        let names = ["a\0.png", "..", "x..y.png", "a//b.png", "a\\\\\\\\b.png", "", "   "];
        let lookup = MapLocator::with(&names);
        for raw in names {
            match classify(raw, Some(doc()), Some(&lookup)) {
                ImageSource::Sidecar { resolved, .. } => assert_eq!(resolved, None, "{:?}", raw),
                other => panic!("unexpected {:?} for {:?}", other, raw),
            }
        }
        assert_eq!(lookup.calls.get(), 0);
    }

    #[test]
    fn test_escaped_name() {
        let lookup = MapLocator::with(&["foo(1).png"]);
        assert_eq!(
            classify("foo\\(1\\).png", Some(doc()), Some(&lookup)),
            ImageSource::Sidecar {
                name: "foo(1).png".into(),
                resolved: Some("/sidecar/foo(1).png".into())
            }
        );
    }
}

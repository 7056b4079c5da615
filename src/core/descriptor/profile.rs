use quick_xml::de::from_str;
use serde::Deserialize;

use crate::core::error::{ManagerError, ManagerResult};

/// Minimal `Profile.xml` model – only the version block matters here.
///
/// vatSys writes the version as attributes (`<Version AIRAC="2401" Revision="1"/>`);
/// the element form (`<Version><AIRAC>2401</AIRAC></Version>`) is accepted too.
#[derive(Debug, Deserialize)]
pub struct DescriptorDocument {
    #[serde(rename = "Version")]
    pub version: VersionBlock,
}

#[derive(Debug, Deserialize)]
pub struct VersionBlock {
    #[serde(rename = "@AIRAC", alias = "AIRAC")]
    pub airac: String,
    #[serde(rename = "@Revision", alias = "Revision", default)]
    pub revision: Option<String>,
}

impl DescriptorDocument {
    /// Parse a descriptor XML string.
    pub fn parse(xml: &str) -> ManagerResult<Self> {
        let doc: DescriptorDocument = from_str(xml)?;
        if doc.version.airac.trim().is_empty() {
            return Err(ManagerError::Descriptor("empty AIRAC in Version".into()));
        }
        Ok(doc)
    }

    /// Canonical version string: `AIRAC.Revision`, or `AIRAC` when the
    /// revision is absent or blank.
    pub fn version_string(&self) -> String {
        format_version(&self.version.airac, self.version.revision.as_deref())
    }
}

pub fn format_version(primary: &str, revision: Option<&str>) -> String {
    match revision {
        Some(rev) if !rev.trim().is_empty() => format!("{primary}.{rev}"),
        _ => primary.to_string(),
    }
}

/// Resolve the version identifier from raw descriptor contents.
pub fn resolve_version(contents: &str) -> ManagerResult<String> {
    DescriptorDocument::parse(contents).map(|doc| doc.version_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_form_with_revision() {
        let xml = r#"
        <Profile Name="Australia" FullName="Australia">
            <Version AIRAC="2401" Revision="2" PublishDate="2024-01-25"/>
            <Servers/>
        </Profile>
        "#;
        assert_eq!(resolve_version(xml).unwrap(), "2401.2");
    }

    #[test]
    fn element_form_without_revision() {
        let xml = r#"
        <Profile>
            <Version>
                <AIRAC>2024-01</AIRAC>
            </Version>
        </Profile>
        "#;
        assert_eq!(resolve_version(xml).unwrap(), "2024-01");
    }

    #[test]
    fn blank_revision_is_dropped() {
        for revision in [None, Some(""), Some("   ")] {
            assert_eq!(format_version("2313", revision), "2313");
        }
        assert_eq!(format_version("2313", Some("4")), "2313.4");
    }

    #[test]
    fn rejects_broken_markup() {
        assert!(resolve_version("<Profile><Version AIRAC=").is_err());
        assert!(resolve_version("<Profile><Servers/></Profile>").is_err());
        assert!(resolve_version(r#"<Profile><Version AIRAC=" "/></Profile>"#).is_err());
    }
}

//! Namespace declaration checks for standalone use.
//!
//! Injecting missing declarations belongs to the loader that feeds this
//! crate; here they are only reported.

use std::fmt;

use super::Document;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceIssue {
    /// Root lacks `xmlns="http://www.w3.org/2000/svg"`.
    MissingSvgNamespace,
    /// `xlink:` attributes are used without `xmlns:xlink`.
    MissingXlinkNamespace,
}

impl fmt::Display for NamespaceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSvgNamespace => {
                write!(f, "root element does not declare xmlns=\"{SVG_NAMESPACE}\"")
            }
            Self::MissingXlinkNamespace => {
                write!(f, "xlink: attributes are used without xmlns:xlink=\"{XLINK_NAMESPACE}\"")
            }
        }
    }
}

impl Document {
    /// Declarations a standalone renderer would need but the markup lacks.
    pub fn namespace_issues(&self) -> Vec<NamespaceIssue> {
        let root = self.root();
        let mut issues = Vec::new();

        let svg_ns_declared = match root.name().split_once(':') {
            Some((prefix, _)) => root.attr_value(&format!("xmlns:{prefix}")) == Some(SVG_NAMESPACE),
            None => root.attr_value("xmlns") == Some(SVG_NAMESPACE),
        };
        if !svg_ns_declared {
            issues.push(NamespaceIssue::MissingSvgNamespace);
        }

        let uses_xlink = self
            .elements()
            .any(|el| el.attributes().iter().any(|a| a.name().starts_with("xlink:")));
        if uses_xlink && root.attr_value("xmlns:xlink") != Some(XLINK_NAMESPACE) {
            issues.push(NamespaceIssue::MissingXlinkNamespace);
        }

        issues
    }
}

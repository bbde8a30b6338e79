//! Error types for workbook reading and transformation.

use thiserror::Error;

use roster_map::MappingError;

/// Errors raised while reading, transforming or writing a workbook.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum XlsxError {
    // =========================================================================
    // Caller input
    // =========================================================================
    /// A requested sheet is not present in the source workbook.
    #[error("sheet '{name}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        name: String,
        available: Vec<String>,
    },

    /// The input is not an Office Open XML package.
    #[error("unsupported workbook format: {0}")]
    UnsupportedFormat(String),

    /// A part the package refers to is absent.
    #[error("missing workbook part: {0}")]
    MissingPart(String),

    /// The package is structurally broken.
    #[error("invalid workbook: {0}")]
    Invalid(String),

    /// A cell or range reference that is not valid A1 notation.
    #[error("invalid cell reference '{0}'")]
    InvalidReference(String),

    // =========================================================================
    // Wrapped errors
    // =========================================================================
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("plain workbook writer error: {0}")]
    PlainWriter(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl XlsxError {
    /// True for errors caused by the caller's input (bad sheet name or an
    /// unreadable workbook) rather than by the mapping configuration or the
    /// environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::SheetNotFound { .. }
                | Self::UnsupportedFormat(_)
                | Self::MissingPart(_)
                | Self::Invalid(_)
                | Self::InvalidReference(_)
                | Self::Zip(_)
                | Self::Xml(_)
                | Self::XmlAttr(_)
                | Self::Utf8(_)
        )
    }

    /// True when the mapping table must be fixed before retrying.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Mapping(error) if error.is_configuration_error())
    }
}

pub type Result<T> = std::result::Result<T, XlsxError>;

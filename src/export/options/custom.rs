use crate::export::{Error, Result};

/// Checks that an operator-supplied export options document is a property
/// list dictionary with a `method` entry.
///
/// The document itself is written out verbatim; this only rejects content
/// `xcodebuild` could never accept.
pub fn validate_custom_export_options(content: &str) -> Result<()> {
    let value = plist::Value::from_reader_xml(content.trim().as_bytes()).map_err(|e| {
        Error::Configuration(format!("custom export options are not a property list: {e}"))
    })?;

    let dict = value.as_dictionary().ok_or_else(|| {
        Error::Configuration("custom export options must be a dictionary".to_string())
    })?;

    if !dict.contains_key("method") {
        return Err(Error::Configuration(
            "custom export options do not declare a 'method'".to_string(),
        ));
    }

    Ok(())
}

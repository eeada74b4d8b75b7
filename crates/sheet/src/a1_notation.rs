use crate::error::{Result, SheetError};

/// Largest zero-based column index a worksheet can address (XFD).
pub const MAX_COLUMN_INDEX: usize = 16_383;

/// Convert a column name to a 0-based column index.
/// A=0, B=1, ... Z=25, AA=26, AB=27, ...
///
/// Each letter contributes `(acc + 1) * 26 + (letter - 'A')`, starting from
/// an accumulator of -1.
pub fn column_name_to_index(name: &str) -> Result<usize> {
    if name.is_empty() {
        return Err(SheetError::InvalidCellReference(name.to_string()));
    }

    let mut column: i64 = -1;
    for b in name.bytes() {
        let b = b.to_ascii_uppercase();
        if !b.is_ascii_uppercase() {
            return Err(SheetError::InvalidCellReference(name.to_string()));
        }
        column = (column + 1) * 26 + i64::from(b - b'A');
        if column > MAX_COLUMN_INDEX as i64 {
            return Err(SheetError::InvalidCellReference(name.to_string()));
        }
    }

    Ok(column as usize)
}

/// Split an A1-style cell reference (e.g. "C12", "$AA$3") into its 0-based
/// column index and 1-based row number.
pub fn split_cell_reference(reference: &str) -> Result<(usize, Option<u32>)> {
    let trimmed = reference.trim().trim_start_matches('$');
    let split_pos = trimmed
        .find(|c: char| c == '$' || c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    let column = column_name_to_index(&trimmed[..split_pos])
        .map_err(|_| SheetError::InvalidCellReference(reference.to_string()))?;

    let row_part = trimmed[split_pos..].trim_start_matches('$');
    let row = if row_part.is_empty() {
        None
    } else {
        Some(
            row_part
                .parse::<u32>()
                .map_err(|_| SheetError::InvalidCellReference(reference.to_string()))?,
        )
    };

    Ok((column, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name_to_index() {
        assert_eq!(column_name_to_index("A").unwrap(), 0);
        assert_eq!(column_name_to_index("C").unwrap(), 2);
        assert_eq!(column_name_to_index("Z").unwrap(), 25);
        assert_eq!(column_name_to_index("AA").unwrap(), 26);
        assert_eq!(column_name_to_index("AB").unwrap(), 27);
        assert_eq!(column_name_to_index("AZ").unwrap(), 51);
        assert_eq!(column_name_to_index("BA").unwrap(), 52);
        assert_eq!(column_name_to_index("ZZ").unwrap(), 701);
        assert_eq!(column_name_to_index("AAA").unwrap(), 702);
        assert_eq!(column_name_to_index("XFD").unwrap(), MAX_COLUMN_INDEX);

        // Test case insensitive
        assert_eq!(column_name_to_index("aa").unwrap(), 26);
    }

    #[test]
    fn test_column_name_errors() {
        assert!(column_name_to_index("").is_err());
        assert!(column_name_to_index("A1").is_err());
        assert!(column_name_to_index("XFE").is_err());
        assert!(column_name_to_index("ABCDEFG").is_err());
    }

    #[test]
    fn test_split_cell_reference() {
        assert_eq!(split_cell_reference("A1").unwrap(), (0, Some(1)));
        assert_eq!(split_cell_reference("C12").unwrap(), (2, Some(12)));
        assert_eq!(split_cell_reference("AA3").unwrap(), (26, Some(3)));
        assert_eq!(split_cell_reference("$AB$7").unwrap(), (27, Some(7)));
        assert_eq!(split_cell_reference("D").unwrap(), (3, None));
    }

    #[test]
    fn test_split_cell_reference_errors() {
        assert!(split_cell_reference("").is_err());
        assert!(split_cell_reference("12").is_err());
        assert!(split_cell_reference("A1B").is_err());
    }
}

/// Number of reserved built-in format ids (0-49 inclusive).
pub const BUILTIN_FORMAT_COUNT: u16 = 50;

/// Built-in number formats, indexed by format id.
///
/// Ids that are reserved but locale-dependent have no portable code and are
/// `None`; callers usually fall back to `General` for those.
const BUILTIN_FORMATS: [Option<&str>; BUILTIN_FORMAT_COUNT as usize] = [
    Some("General"),
    Some("0"),
    Some("0.00"),
    Some("#,##0"),
    Some("#,##0.00"),
    Some("\"$\"#,##0_);(\"$\"#,##0)"),
    Some("\"$\"#,##0_);[Red](\"$\"#,##0)"),
    Some("\"$\"#,##0.00_);(\"$\"#,##0.00)"),
    Some("\"$\"#,##0.00_);[Red](\"$\"#,##0.00)"),
    Some("0%"),
    Some("0.00%"),
    Some("0.00E+00"),
    Some("# ?/?"),
    Some("# ??/??"),
    Some("m/d/yy"),
    Some("d-mmm-yy"),
    Some("d-mmm"),
    Some("mmm-yy"),
    Some("h:mm AM/PM"),
    Some("h:mm:ss AM/PM"),
    Some("h:mm"),
    Some("h:mm:ss"),
    Some("m/d/yy h:mm"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    Some("#,##0_);(#,##0)"),
    Some("#,##0_);[Red](#,##0)"),
    Some("#,##0.00_);(#,##0.00)"),
    Some("#,##0.00_);[Red](#,##0.00)"),
    Some("_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)"),
    Some("_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)"),
    Some("_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)"),
    Some("_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)"),
    Some("mm:ss"),
    Some("[h]:mm:ss"),
    Some("mm:ss.0"),
    Some("##0.0E+0"),
    Some("@"),
];

/// Look up the code of a built-in number format id.
pub fn builtin_format(index: u16) -> Option<&'static str> {
    BUILTIN_FORMATS.get(usize::from(index)).copied().flatten()
}

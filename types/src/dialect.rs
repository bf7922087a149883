//! Database platform family identification
//!
//! Generators are registered per platform key. The key is derived from the
//! platform name reported by the active connection, so several vendor names
//! collapse onto one family (MariaDB speaks the MySQL JSON dialect).

/// SQL dialect for database-specific behavior
///
/// # Examples
///
/// ```
/// use aggregated_types::Dialect;
///
/// let dialect = Dialect::PostgreSQL;
/// assert!(dialect.uses_numbered_placeholders());
///
/// let mysql = Dialect::MySQL;
/// assert!(!mysql.uses_numbered_placeholders());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    /// MySQL family - uses `?` positional placeholders
    ///
    /// Also covers MariaDB.
    #[default]
    MySQL,

    /// PostgreSQL - uses `$1, $2, ...` numbered placeholders
    PostgreSQL,
}

impl Dialect {
    /// Every supported dialect, in registration order.
    pub const ALL: [Dialect; 2] = [Dialect::MySQL, Dialect::PostgreSQL];

    /// Returns `true` if this dialect uses numbered placeholders (`$1, $2, ...`)
    #[inline]
    #[must_use]
    pub const fn uses_numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::PostgreSQL)
    }

    /// Parse a dialect from a platform name (case-insensitive, surrounding
    /// whitespace ignored)
    ///
    /// Supports various common aliases:
    /// - MySQL: `"mysql"`, `"mariadb"`
    /// - PostgreSQL: `"postgresql"`, `"postgres"`, `"pg"`, `"pgsql"`
    ///
    /// # Examples
    ///
    /// ```
    /// use aggregated_types::Dialect;
    ///
    /// assert_eq!(Dialect::parse("MariaDB"), Some(Dialect::MySQL));
    /// assert_eq!(Dialect::parse("postgres"), Some(Dialect::PostgreSQL));
    /// assert_eq!(Dialect::parse("sqlite"), None);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("mysql") || s.eq_ignore_ascii_case("mariadb") {
            Some(Dialect::MySQL)
        } else if s.eq_ignore_ascii_case("postgresql")
            || s.eq_ignore_ascii_case("postgres")
            || s.eq_ignore_ascii_case("pg")
            || s.eq_ignore_ascii_case("pgsql")
        {
            Some(Dialect::PostgreSQL)
        } else {
            None
        }
    }

    /// Get the platform key for this dialect
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySQL => "mysql",
            Dialect::PostgreSQL => "postgresql",
        }
    }

    /// Renders a placeholder for this dialect with the given 1-based index.
    ///
    /// - PostgreSQL: `$1`, `$2`, `$3`
    /// - MySQL: `?`
    #[must_use]
    pub fn render_placeholder(&self, index: usize) -> String {
        match self {
            Dialect::PostgreSQL => format!("${index}"),
            Dialect::MySQL => String::from("?"),
        }
    }
}

/// Normalizes a platform name into the key generators are registered under.
///
/// Known families collapse onto their canonical key; anything else is
/// trimmed and lowercased so unknown platforms still produce a stable key
/// for error reporting.
///
/// ```
/// use aggregated_types::platform_key;
///
/// assert_eq!(platform_key("MariaDB"), "mysql");
/// assert_eq!(platform_key(" PG "), "postgresql");
/// assert_eq!(platform_key("SQLite"), "sqlite");
/// ```
#[must_use]
pub fn platform_key(platform: &str) -> String {
    match Dialect::parse(platform) {
        Some(dialect) => dialect.as_str().to_string(),
        None => platform.trim().to_ascii_lowercase(),
    }
}

impl core::fmt::Display for Dialect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Dialect {
    type Err = DialectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::parse(s).ok_or(DialectParseError)
    }
}

/// Error returned when parsing an unknown dialect string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectParseError;

impl core::fmt::Display for DialectParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("unknown dialect")
    }
}

impl std::error::Error for DialectParseError {}

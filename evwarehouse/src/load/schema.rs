//! Table layouts and row binding for the warehouse store.

use rusqlite::{params, Statement};

use crate::model::{FactRow, LocationRow, TimeRow, UtilityRow, VehicleRow, FACT_TABLE};

/// A column definition: name and SQL type clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: &'static str,
    /// Type and constraints, e.g. `INTEGER PRIMARY KEY`.
    pub definition: &'static str,
}

const fn col(name: &'static str, definition: &'static str) -> Column {
    Column { name, definition }
}

/// A row type persisted as one table.
pub trait TableRow {
    /// Table name.
    const TABLE: &'static str;

    /// Columns in insert order; the first is the primary key.
    const COLUMNS: &'static [Column];

    /// Binds this row to a prepared `INSERT` built by [`insert_sql`].
    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

/// `CREATE TABLE` statement for `R`.
#[must_use]
pub fn create_sql<R: TableRow>() -> String {
    let columns: Vec<String> = R::COLUMNS
        .iter()
        .map(|c| format!("{} {}", c.name, c.definition))
        .collect();
    format!("CREATE TABLE {} ({})", R::TABLE, columns.join(", "))
}

/// Parameterised `INSERT` statement for `R`.
#[must_use]
pub fn insert_sql<R: TableRow>() -> String {
    let names: Vec<&str> = R::COLUMNS.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        R::TABLE,
        names.join(", "),
        placeholders.join(", ")
    )
}

/// A secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    /// Index name.
    pub name: &'static str,
    /// Indexed table.
    pub table: &'static str,
    /// Indexed column.
    pub column: &'static str,
}

impl IndexDef {
    /// `CREATE INDEX` statement.
    #[must_use]
    pub fn create_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({})",
            self.name, self.table, self.column
        )
    }
}

const fn index(name: &'static str, table: &'static str, column: &'static str) -> IndexDef {
    IndexDef {
        name,
        table,
        column,
    }
}

/// Fact foreign keys plus one filter column per dimension.
pub const INDEXES: [IndexDef; 8] = [
    index("idx_fact_location", FACT_TABLE, "location_id"),
    index("idx_fact_vehicle", FACT_TABLE, "vehicle_id"),
    index("idx_fact_utility", FACT_TABLE, "utility_id"),
    index("idx_fact_time", FACT_TABLE, "time_id"),
    index("idx_location_county", "dim_location", "county"),
    index("idx_vehicle_make", "dim_vehicle", "make"),
    index("idx_utility_name", "dim_utility", "utility_name"),
    index("idx_time_year", "dim_time", "model_year"),
];

impl TableRow for LocationRow {
    const TABLE: &'static str = "dim_location";
    const COLUMNS: &'static [Column] = &[
        col("location_id", "INTEGER PRIMARY KEY"),
        col("county", "TEXT NOT NULL"),
        col("city", "TEXT NOT NULL"),
        col("state", "TEXT"),
        col("postal_code", "TEXT NOT NULL"),
        col("legislative_district", "TEXT NOT NULL"),
        col("census_tract", "TEXT NOT NULL"),
        col("latitude", "REAL"),
        col("longitude", "REAL"),
    ];

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.location_id,
            self.county,
            self.city,
            self.state,
            self.postal_code,
            self.legislative_district,
            self.census_tract,
            self.latitude,
            self.longitude,
        ])
    }
}

impl TableRow for VehicleRow {
    const TABLE: &'static str = "dim_vehicle";
    const COLUMNS: &'static [Column] = &[
        col("vehicle_id", "INTEGER PRIMARY KEY"),
        col("make", "TEXT NOT NULL"),
        col("model", "TEXT NOT NULL"),
        col("vehicle_type", "TEXT NOT NULL"),
        col("eligibility_category", "TEXT NOT NULL"),
        col("ev_type_code", "INTEGER NOT NULL"),
        col("cafv_code", "INTEGER NOT NULL"),
    ];

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.vehicle_id,
            self.make,
            self.model,
            self.vehicle_type,
            self.eligibility_category,
            self.ev_type_code,
            self.cafv_code,
        ])
    }
}

impl TableRow for UtilityRow {
    const TABLE: &'static str = "dim_utility";
    const COLUMNS: &'static [Column] = &[
        col("utility_id", "INTEGER PRIMARY KEY"),
        col("utility_name", "TEXT NOT NULL"),
    ];

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![self.utility_id, self.utility_name])
    }
}

impl TableRow for TimeRow {
    const TABLE: &'static str = "dim_time";
    const COLUMNS: &'static [Column] = &[
        col("time_id", "INTEGER PRIMARY KEY"),
        col("model_year", "INTEGER"),
        col("model_decade", "INTEGER"),
        col("year_category", "TEXT"),
    ];

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.time_id,
            self.model_year,
            self.model_decade,
            self.year_category.map(|c| c.label()),
        ])
    }
}

impl TableRow for FactRow {
    const TABLE: &'static str = FACT_TABLE;
    const COLUMNS: &'static [Column] = &[
        col("registration_id", "INTEGER PRIMARY KEY"),
        col("location_id", "INTEGER REFERENCES dim_location(location_id)"),
        col("vehicle_id", "INTEGER REFERENCES dim_vehicle(vehicle_id)"),
        col("utility_id", "INTEGER REFERENCES dim_utility(utility_id)"),
        col("time_id", "INTEGER REFERENCES dim_time(time_id)"),
        col("base_msrp", "REAL NOT NULL"),
        col("electric_range", "REAL"),
        col("external_vehicle_id", "INTEGER"),
        col("vin_hash", "TEXT NOT NULL"),
    ];

    fn insert(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        stmt.execute(params![
            self.registration_id,
            self.location_id,
            self.vehicle_id,
            self.utility_id,
            self.time_id,
            self.base_msrp,
            self.electric_range,
            self.external_vehicle_id,
            self.vin_hash,
        ])
    }
}

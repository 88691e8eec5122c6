//! Bulk ingredient import from a `name,measurement_unit` CSV, for seeding
//! a fresh deployment's ingredient reference table.

use crate::database;
use crate::query;
use crate::Result;
use std::path::Path;

struct IngredientRow {
    name: String,
    measurement_unit: String,
}

pub struct IngredientImporter {
    rows: Vec<IngredientRow>,
    num_created: usize,
    num_seen: usize,
}

impl IngredientImporter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        let rows = reader
            .deserialize()
            .map(|row| {
                row.map(|(name, measurement_unit): (String, String)| IngredientRow {
                    name,
                    measurement_unit,
                })
            })
            .collect::<std::result::Result<Vec<IngredientRow>, _>>()?;
        Ok(Self {
            rows,
            num_created: 0,
            num_seen: 0,
        })
    }

    pub fn done(&self) -> bool {
        self.num_seen == self.rows.len()
    }

    pub fn num_created(&self) -> usize {
        self.num_created
    }

    pub fn import_one(&mut self, conn: &mut database::Connection) -> Result<()> {
        assert!(!self.done());

        let row = &self.rows[self.num_seen];
        let (_, created) = query::get_or_create_ingredient(conn, &row.name, &row.measurement_unit)?;
        if created {
            self.num_created += 1;
        }
        self.num_seen += 1;
        Ok(())
    }
}

pub fn import_ingredients(mut conn: database::Connection, path: impl AsRef<Path>) -> Result<()> {
    let mut importer = IngredientImporter::new(path)?;

    while !importer.done() {
        importer.import_one(&mut conn)?;
    }
    log::info!("imported {} new ingredients", importer.num_created());

    Ok(())
}

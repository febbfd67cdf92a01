//! Ordered atlas table and lookups.
//!
//! An [`AtlasTable`] maps sheet ids to [`PartMap`]s, and each part map maps
//! part names to [`NormRect`]s. Both levels keep the order in which entries
//! appear in the source text, so every "first match" lookup is
//! deterministic.
//!
//! Records are read when the table is built but never fail it: a record
//! without four numbers at fields 3..=6 is kept with the reason, and the
//! error surfaces only when that part is looked up or extracted.

use crate::lua::{self, LuaKey, LuaTable, LuaValue};
use crate::{InfoError, InfoResult};
use atlas_core::NormRect;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Positional fields of a record that hold left, right, top, bottom.
const RECT_FIELDS: std::ops::RangeInclusive<usize> = 3..=6;

/// Insertion-ordered map of part name to rectangle.
///
/// A part whose record could not be read holds the reason instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartMap {
    entries: Vec<(String, Result<NormRect, String>)>,
    index: HashMap<String, usize>,
}

impl PartMap {
    /// Creates an empty part map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a part. An existing name keeps its position and takes the new rectangle.
    pub fn insert(&mut self, name: impl Into<String>, rect: NormRect) {
        self.insert_record(name.into(), Ok(rect));
    }

    /// Inserts a part whose record has no usable rectangle.
    pub fn insert_invalid(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.insert_record(name.into(), Err(reason.into()));
    }

    fn insert_record(&mut self, name: String, record: Result<NormRect, String>) {
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = record,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, record));
            }
        }
    }

    /// Rectangle of a part by exact name, or why its record is unusable.
    pub fn get(&self, name: &str) -> Option<Result<NormRect, &str>> {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1.as_ref().copied().map_err(String::as_str))
    }

    /// Returns `true` if the part exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Parts in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Result<NormRect, &str>)> {
        self.entries
            .iter()
            .map(|(n, r)| (n.as_str(), r.as_ref().copied().map_err(String::as_str)))
    }

    /// Number of parts whose record is unusable.
    pub fn invalid_count(&self) -> usize {
        self.entries.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// Part names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no parts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A sheet id together with its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet path relative to the art root, e.g. `Interface/QuestFrame/QuestFrame`.
    pub id: String,
    /// Parts defined on this sheet.
    pub parts: PartMap,
}

impl Sheet {
    /// Last path component of the id, without extension.
    ///
    /// Used as the per-sheet output directory name.
    ///
    /// ```rust
    /// use atlas_info::{PartMap, Sheet};
    ///
    /// let sheet = Sheet { id: "Interface/Buttons/UI-Panel.blp".into(), parts: PartMap::new() };
    /// assert_eq!(sheet.base_name(), "UI-Panel");
    /// ```
    pub fn base_name(&self) -> &str {
        let file = self
            .id
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.id.as_str());
        match file.rfind('.') {
            Some(dot) if dot > 0 => &file[..dot],
            _ => file,
        }
    }
}

/// Every sheet and part of an atlas table, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtlasTable {
    sheets: Vec<Sheet>,
    index: HashMap<String, usize>,
}

impl AtlasTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses Lua source into a table.
    ///
    /// # Example
    ///
    /// ```rust
    /// use atlas_info::AtlasTable;
    ///
    /// let table = AtlasTable::parse(r#"
    ///     return { ["sheetA"] = { ["foo"] = { 0, 0, 0, 0.1, 0.5, 0.2, 0.6 } } }
    /// "#).unwrap();
    ///
    /// let (sheet, rect) = table.find_part_by_name("foo").unwrap();
    /// assert_eq!(sheet, "sheetA");
    /// assert_eq!(rect.unwrap().left, 0.1);
    /// ```
    pub fn parse(source: &str) -> InfoResult<Self> {
        trace!(bytes = source.len(), "AtlasTable::parse");
        let value = lua::parse(source)?;
        let table = Self::from_lua(&value)?;

        let invalid: usize = table.sheets().map(|s| s.parts.invalid_count()).sum();
        if invalid > 0 {
            warn!(invalid, "Records without four numbers at fields 3..=6");
        }
        debug!(sheets = table.len(), "Parsed atlas table");
        Ok(table)
    }

    /// Builds a table from an already parsed Lua value.
    ///
    /// The value must be a table of `sheet = { part = record }`. Records are
    /// arrays whose positional fields 3..=6 should be numbers; one that is
    /// not is kept as invalid and reported on lookup.
    pub fn from_lua(value: &LuaValue) -> InfoResult<Self> {
        let root = value.as_table().ok_or_else(|| {
            InfoError::InvalidStructure(format!("expected a table, found {}", value.type_name()))
        })?;
        if !root.array.is_empty() {
            return Err(InfoError::InvalidStructure(
                "top-level table has positional entries".into(),
            ));
        }

        let mut table = Self::new();
        for (key, value) in &root.fields {
            let sheet_id = string_key(key, "sheet")?;
            let parts_table = value.as_table().ok_or_else(|| {
                InfoError::InvalidStructure(format!(
                    "sheet '{}' is a {}, expected a table",
                    sheet_id,
                    value.type_name()
                ))
            })?;

            let mut parts = PartMap::new();
            for (key, record) in &parts_table.fields {
                let part = string_key(key, "part")?;
                match parse_record(record) {
                    Ok(rect) => parts.insert(part, rect),
                    Err(reason) => {
                        trace!(sheet = sheet_id, part, %reason, "Invalid record");
                        parts.insert_invalid(part, reason);
                    }
                }
            }
            if !parts_table.array.is_empty() {
                return Err(InfoError::InvalidStructure(format!(
                    "sheet '{}' has positional entries",
                    sheet_id
                )));
            }

            table.insert_sheet(sheet_id, parts);
        }

        Ok(table)
    }

    /// Adds one part, creating its sheet on first use.
    pub fn insert(&mut self, sheet: impl Into<String>, part: impl Into<String>, rect: NormRect) {
        let sheet = sheet.into();
        let i = self.sheet_slot(sheet);
        self.sheets[i].parts.insert(part, rect);
    }

    /// Adds a sheet. An existing id keeps its position and takes the new parts.
    fn insert_sheet(&mut self, id: &str, parts: PartMap) {
        let i = self.sheet_slot(id.to_string());
        self.sheets[i].parts = parts;
    }

    fn sheet_slot(&mut self, id: String) -> usize {
        if let Some(&i) = self.index.get(&id) {
            return i;
        }
        let i = self.sheets.len();
        self.index.insert(id.clone(), i);
        self.sheets.push(Sheet {
            id,
            parts: PartMap::new(),
        });
        i
    }

    /// Sheets in table order.
    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    /// Sheet by exact id.
    pub fn sheet(&self, id: &str) -> Option<&Sheet> {
        self.index.get(id).map(|&i| &self.sheets[i])
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Returns `true` if the table has no sheets.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Finds a part by exact name.
    ///
    /// Sheets are scanned in table order; the first one defining the part wins.
    /// A part whose record is unusable is found, with
    /// [`InfoError::InvalidRecord`] in place of its rectangle.
    pub fn find_part_by_name(&self, name: &str) -> Option<(&str, InfoResult<NormRect>)> {
        self.sheets.iter().find_map(|s| {
            let record = s.parts.get(name)?;
            let rect = record.map_err(|reason| InfoError::InvalidRecord {
                sheet: s.id.clone(),
                part: name.to_string(),
                reason: reason.to_string(),
            });
            Some((s.id.as_str(), rect))
        })
    }

    /// Sheet id of the first sheet defining `name`.
    pub fn find_sheet_by_part_name(&self, name: &str) -> Option<&str> {
        self.find_part_by_name(name).map(|(sheet, _)| sheet)
    }

    /// First sheet, in table order, whose id contains `needle`.
    pub fn find_part_map_by_sheet_substring(&self, needle: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id.contains(needle))
    }
}

fn string_key<'a>(key: &'a LuaKey, what: &str) -> InfoResult<&'a str> {
    match key {
        LuaKey::Str(s) => Ok(s),
        other => Err(InfoError::InvalidStructure(format!(
            "{} key must be a string, found {:?}",
            what, other
        ))),
    }
}

/// Reads the rectangle out of one record, or says why it cannot.
fn parse_record(record: &LuaValue) -> Result<NormRect, String> {
    let fields: &LuaTable = record
        .as_table()
        .ok_or_else(|| format!("expected an array, found {}", record.type_name()))?;

    if fields.array.len() <= *RECT_FIELDS.end() {
        return Err(format!(
            "expected at least {} fields, found {}",
            RECT_FIELDS.end() + 1,
            fields.array.len()
        ));
    }

    let mut v = [0.0f64; 4];
    for (slot, i) in v.iter_mut().zip(RECT_FIELDS) {
        *slot = fields.array[i].as_number().ok_or_else(|| {
            format!(
                "field {} is a {}, expected a number",
                i,
                fields.array[i].type_name()
            )
        })?;
    }

    Ok(NormRect::new(v[0], v[1], v[2], v[3]))
}

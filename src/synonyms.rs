use std::collections::HashMap;

use crate::domain::{Entity, Field, SynonymSet, SynonymSource};

/// Synonym lists of one cross-reference database, keyed by its identifier.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    source: SynonymSource,
    entries: HashMap<String, Vec<String>>,
}

impl SynonymTable {
    pub fn new(source: SynonymSource) -> Self {
        Self {
            source,
            entries: HashMap::new(),
        }
    }

    pub fn source(&self) -> SynonymSource {
        self.source
    }

    /// Appends names to the list of `id`, creating it if needed.
    pub fn extend<I, S>(&mut self, id: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry(id.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
    }

    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.entries.get(id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects the entity's own name plus every synonym reachable through its
/// cross-references, in the order the tables are given.
pub fn collect_synonyms(entity: &Entity, tables: &[SynonymTable]) -> SynonymSet {
    let mut synonyms = SynonymSet::new();
    if let Some(name) = entity.get(&Field::Name) {
        for member in name.members() {
            synonyms.insert(member);
        }
    }
    for table in tables {
        let Some(ids) = entity.get(&table.source().field()) else {
            continue;
        };
        for id in ids.members() {
            for name in table.get(id).unwrap_or_default() {
                synonyms.insert(name);
            }
        }
    }
    synonyms
}

/// Shortest synonym by character count; the earliest inserted wins ties.
pub fn select_display_name(synonyms: &SynonymSet) -> Option<&str> {
    synonyms.iter().min_by_key(|name| name.chars().count())
}

/// Collects synonyms and fills in a display name when the entity has none.
pub fn annotate(entity: &mut Entity, tables: &[SynonymTable]) -> SynonymSet {
    let synonyms = collect_synonyms(entity, tables);
    if entity.name().is_none() {
        if let Some(name) = select_display_name(&synonyms) {
            entity.set_name(name.to_string());
        }
    }
    synonyms
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::FieldValue;

    const GLUCOSE_KEY: &str = "WQZGKKKJIJFFOK-GASJEMHNSA-N";

    fn entity(fields: &[(Field, FieldValue)]) -> Entity {
        let mut map = BTreeMap::from([(Field::InchiKey, FieldValue::from(GLUCOSE_KEY))]);
        map.extend(fields.iter().cloned());
        Entity::new(GLUCOSE_KEY, map)
    }

    fn tables() -> Vec<SynonymTable> {
        let mut hmdb = SynonymTable::new(SynonymSource::Hmdb);
        hmdb.extend("HMDB0000122", ["D-Glucose", "Dextrose", "Grape sugar"]);
        hmdb.extend("HMDB0006564", ["Glucose"]);
        let mut pubchem = SynonymTable::new(SynonymSource::PcCompound);
        pubchem.extend("5793", ["D-glucopyranose", "Dextrose"]);
        let mut lipid = SynonymTable::new(SynonymSource::Lmid);
        lipid.extend("LMFA01010001", ["Palmitic acid"]);
        vec![hmdb, pubchem, lipid]
    }

    #[test]
    fn collects_across_tables_without_duplicates() {
        let entity = entity(&[
            (Field::Name, FieldValue::from("D-Glucose")),
            (Field::Hmdb, FieldValue::from("HMDB0000122")),
            (Field::PubchemCompound, FieldValue::from("5793")),
        ]);
        let synonyms = collect_synonyms(&entity, &tables());
        assert_eq!(
            synonyms.iter().collect::<Vec<_>>(),
            vec!["D-Glucose", "Dextrose", "Grape sugar", "D-glucopyranose"]
        );
    }

    #[test]
    fn multi_valued_ids_are_expanded() {
        let entity = entity(&[(
            Field::Hmdb,
            FieldValue::set(["HMDB0000122", "HMDB0006564"]),
        )]);
        let synonyms = collect_synonyms(&entity, &tables());
        assert!(synonyms.contains("Glucose"));
        assert!(synonyms.contains("Grape sugar"));
        assert_eq!(synonyms.len(), 4);
    }

    #[test]
    fn fills_missing_name_with_shortest() {
        let mut entity = entity(&[(Field::Hmdb, FieldValue::from("HMDB0000122"))]);
        let synonyms = annotate(&mut entity, &tables());
        assert_eq!(synonyms.len(), 3);
        assert_eq!(entity.name(), Some(&FieldValue::from("Dextrose")));
    }

    #[test]
    fn existing_name_is_kept() {
        let mut entity = entity(&[
            (Field::Name, FieldValue::from("D-Glucose")),
            (Field::Hmdb, FieldValue::from("HMDB0006564")),
        ]);
        let before = entity.clone();
        let synonyms = annotate(&mut entity, &tables());
        assert_eq!(entity, before);
        assert!(synonyms.contains("Glucose"));
    }

    #[test]
    fn shortest_tie_goes_to_first_inserted() {
        let mut synonyms = SynonymSet::new();
        synonyms.insert("Gamma");
        synonyms.insert("Alpha");
        synonyms.insert("Glucose");
        assert_eq!(select_display_name(&synonyms), Some("Gamma"));
    }

    #[test]
    fn no_synonyms_leaves_entity_unnamed() {
        let mut entity = entity(&[(Field::Kegg, FieldValue::from("C00031"))]);
        let synonyms = annotate(&mut entity, &tables());
        assert!(synonyms.is_empty());
        assert!(entity.name().is_none());
    }
}

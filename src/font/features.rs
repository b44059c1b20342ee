//! OpenType lookups
//!
//! Lookups are kept in creation order, except where a lookup has to come
//! after another one (mark-to-mark after mark-to-base). Each lookup owns its
//! subtables, and each subtable its rules.

use super::kerning::KerningClassTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    GsubSingle,
    GsubMultiple,
    GsubLigature,
    GsubContextChain,
    GposPair,
    GposMarkToBase,
    GposMarkToMark,
}

/// A script and the languages a feature applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptLanguages {
    pub script: String,
    pub languages: Vec<String>,
}

impl ScriptLanguages {
    pub fn new(script: &str, languages: &[&str]) -> Self {
        Self {
            script: script.to_string(),
            languages: languages.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rule {
    Single {
        glyph: String,
        replacement: String,
    },
    Multiple {
        glyph: String,
        replacement: Vec<String>,
    },
    Ligature {
        components: Vec<String>,
        ligature: String,
    },
    Pair {
        left: String,
        right: String,
        kern: i64,
    },
    /// Context rule in the `backtrack | input @<lookup> | lookahead` notation
    ContextChain {
        rule: String,
    },
    KerningClasses(KerningClassTable),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subtable {
    pub name: String,
    pub anchor_classes: Vec<String>,
    pub rules: Vec<Rule>,
}

impl Subtable {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            anchor_classes: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn push_rule(&mut self, rule: Rule) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    pub fn add_anchor_class(&mut self, class: &str) {
        if !self.anchor_classes.iter().any(|c| c == class) {
            self.anchor_classes.push(class.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lookup {
    pub name: String,
    pub kind: LookupKind,
    /// Feature tag, if the lookup is registered under one. Lookups that are
    /// only reached from a context rule have none.
    pub feature: Option<String>,
    pub scripts: Vec<ScriptLanguages>,
    pub subtables: Vec<Subtable>,
}

impl Lookup {
    pub fn subtable(&self, name: &str) -> Option<&Subtable> {
        self.subtables.iter().find(|s| s.name == name)
    }

    /// The subtable called `name`, created at the end if it doesn't exist
    pub fn subtable_mut(&mut self, name: &str) -> &mut Subtable {
        let index = match self.subtables.iter().position(|s| s.name == name) {
            Some(index) => index,
            None => {
                self.subtables.push(Subtable::new(name));
                self.subtables.len() - 1
            }
        };
        &mut self.subtables[index]
    }
}

/// What a lookup looks like when it has to be created
#[derive(Debug, Clone, Copy)]
pub struct LookupSpec<'a> {
    pub name: &'a str,
    pub kind: LookupKind,
    pub feature: Option<&'a str>,
    /// Place a new lookup right after this one, if it exists
    pub after: Option<&'a str>,
}

/// Subtable name with the optional run index appended
pub fn subtable_name(base: &str, index: Option<u32>) -> String {
    match index {
        Some(index) => format!("{base}_{index}"),
        None => base.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lookups(pub Vec<Lookup>);

impl Lookups {
    pub fn get(&self, name: &str) -> Option<&Lookup> {
        self.0.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Lookup> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The lookup named in `spec`, created if it doesn't exist yet
    pub fn ensure(&mut self, spec: LookupSpec<'_>, scripts: &[ScriptLanguages]) -> &mut Lookup {
        if let Some(index) = self.0.iter().position(|l| l.name == spec.name) {
            return &mut self.0[index];
        }
        let lookup = Lookup {
            name: spec.name.to_string(),
            kind: spec.kind,
            feature: spec.feature.map(str::to_string),
            scripts: if spec.feature.is_some() { scripts.to_vec() } else { Vec::new() },
            subtables: Vec::new(),
        };
        let index = spec
            .after
            .and_then(|after| self.0.iter().position(|l| l.name == after))
            .map_or(self.0.len(), |i| i + 1);
        self.0.insert(index, lookup);
        &mut self.0[index]
    }

    /// Shorthand for [`Lookups::ensure`] followed by [`Lookup::subtable_mut`]
    pub fn subtable_mut(
        &mut self,
        spec: LookupSpec<'_>,
        scripts: &[ScriptLanguages],
        subtable: &str,
    ) -> &mut Subtable {
        self.ensure(spec, scripts).subtable_mut(subtable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<'a>(name: &'a str, after: Option<&'a str>) -> LookupSpec<'a> {
        LookupSpec {
            name,
            kind: LookupKind::GposMarkToBase,
            feature: Some("mark"),
            after,
        }
    }

    #[test]
    fn test_lookups_keep_creation_order() {
        let mut lookups = Lookups::default();
        lookups.ensure(spec("gpos_pair", None), &[]);
        lookups.ensure(spec("gpos_mark2base", None), &[]);
        lookups.ensure(spec("gpos_pair", None), &[]);
        let names: Vec<&str> = lookups.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["gpos_pair", "gpos_mark2base"]);
    }

    #[test]
    fn test_lookup_inserted_after_anchor() {
        let mut lookups = Lookups::default();
        lookups.ensure(spec("gpos_mark2base", None), &[]);
        lookups.ensure(spec("gpos_pair", None), &[]);
        lookups.ensure(spec("gpos_mark2mark", Some("gpos_mark2base")), &[]);
        let names: Vec<&str> = lookups.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["gpos_mark2base", "gpos_mark2mark", "gpos_pair"]);
    }

    #[test]
    fn test_rules_are_not_duplicated() {
        let mut lookups = Lookups::default();
        let rule = Rule::Single {
            glyph: "a".to_string(),
            replacement: "a.sc".to_string(),
        };
        let subtable = lookups.subtable_mut(spec("gsub_single_smcp", None), &[], "gsub_single_smcp_subtable");
        subtable.push_rule(rule.clone());
        subtable.push_rule(rule);
        assert_eq!(lookups.get("gsub_single_smcp").map(|l| l.subtables[0].rules.len()), Some(1));
        assert_eq!(subtable_name("gpos_pair_subtable", Some(2)), "gpos_pair_subtable_2");
    }
}

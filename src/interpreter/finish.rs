//! Table post-pass
//!
//! Ligtable operands are codes or strings until every glyph exists. Here
//! they are resolved to glyph names and turned into lookups, and the
//! variant chains, references and font-wide values are attached.

use super::shipout::round_outline;
use super::{Interpreter, KernPair, LigatureResult, LigatureRule};
use crate::engine::OutlineEngine;
use crate::font::math::{default_math_constants, MathInputs};
use crate::font::names::normalize_encoding_name;
use crate::font::{
    subtable_name, CharRef, KerningClassTable, LookupKind, LookupSpec, Reference, Rule, Subtable, VerticalComponent,
};
use crate::geometry::utilities::round_units;
use tracing::{debug, warn};

const CONTEXT_CHAIN: &str = "gsub_contextchain";

impl<E: OutlineEngine> Interpreter<E> {
    pub(super) fn build_tables(&mut self) {
        self.build_ligatures();
        let kerns = std::mem::take(&mut self.tables.kerns);
        let kerns = self.top_accents_from_skewchar(kerns);
        self.build_kerning(&kerns);
        // extensibles first, they take the last variant out of a charlist
        self.build_extensibles();
        self.build_charlists();
        self.apply_font_post_process();
        self.attach_references();
        self.build_replacements();
        if self.settings.set_math_defaults {
            self.set_math_defaults();
        }
    }

    fn glyph_name(&self, char_ref: &CharRef) -> String {
        self.font.resolve_name(char_ref, self.settings.generalized_code)
    }

    /// Subtable `base` (with the run index) of the lookup in `spec`
    fn subtable(&mut self, spec: LookupSpec<'_>, base: &str) -> &mut Subtable {
        let name = subtable_name(base, self.settings.subtable_index);
        self.font.lookups.subtable_mut(spec, &self.settings.scripts, &name)
    }

    fn build_ligatures(&mut self) {
        for rule in std::mem::take(&mut self.tables.ligatures) {
            let result = match &rule.result {
                LigatureResult::Char(c) => self.glyph_name(c),
                LigatureResult::Glyph(name) => name.clone(),
                LigatureResult::NextGlyph => {
                    warn!("ligature without a glyph shipped after it, ignored");
                    continue;
                }
            };
            let components: Vec<String> = rule.components.iter().map(|c| self.glyph_name(c)).collect();
            if let Some(missing) = components
                .iter()
                .chain(std::iter::once(&result))
                .find(|name| self.font.glyph(name).is_none())
            {
                warn!(
                    "ligature {} {} ignored, glyph {missing} is unknown",
                    rule.shape.spelling(),
                    components.join(" ")
                );
                continue;
            }
            self.add_ligature(&rule, result, components);
        }
    }

    fn add_ligature(&mut self, rule: &LigatureRule, result: String, components: Vec<String>) {
        let shape = rule.shape;
        if !shape.left_pipe && !shape.right_pipe {
            let lookup = format!("gsub_ligature_{}", rule.feature);
            let spec = LookupSpec {
                name: &lookup,
                kind: LookupKind::GsubLigature,
                feature: Some(rule.feature.as_str()),
                after: None,
            };
            self.subtable(spec, &format!("{lookup}_subtable")).push_rule(Rule::Ligature {
                components,
                ligature: result,
            });
            return;
        }

        let [first, second] = &components[..] else {
            warn!("ligature {} needs two components, ignored", shape.spelling());
            return;
        };
        let (lookup, kind, substitution, context) = match (shape.left_pipe, shape.right_pipe) {
            (true, false) => {
                let lookup = format!("gsub_single_after_{first}");
                let context = format!("{first} | {second} @<{lookup}> |");
                let substitution = Rule::Single {
                    glyph: second.clone(),
                    replacement: result,
                };
                (lookup, LookupKind::GsubSingle, substitution, context)
            }
            (false, true) => {
                let lookup = format!("gsub_single_before_{second}");
                let context = format!("| {first} @<{lookup}> | {second}");
                let substitution = Rule::Single {
                    glyph: first.clone(),
                    replacement: result,
                };
                (lookup, LookupKind::GsubSingle, substitution, context)
            }
            _ => {
                let lookup = format!("gsub_multiple_between_{first}_{second}");
                let context = format!("{first} | {second} @<{lookup}> |");
                let substitution = Rule::Multiple {
                    glyph: second.clone(),
                    replacement: vec![result, second.clone()],
                };
                (lookup, LookupKind::GsubMultiple, substitution, context)
            }
        };

        let spec = LookupSpec {
            name: &lookup,
            kind,
            feature: None,
            after: None,
        };
        self.subtable(spec, &format!("{lookup}_subtable")).push_rule(substitution);

        // one context subtable per glyph pair
        let context_spec = LookupSpec {
            name: CONTEXT_CHAIN,
            kind: LookupKind::GsubContextChain,
            feature: Some("calt"),
            after: None,
        };
        self.font
            .lookups
            .ensure(context_spec, &self.settings.scripts)
            .subtable_mut(&format!("gsub_contextchain_subtable_{first}_{second}"))
            .push_rule(Rule::ContextChain { rule: context });
    }

    fn skewchar(&self) -> Option<i64> {
        if self.settings.skewchar >= 0 {
            return Some(self.settings.skewchar);
        }
        match self.settings.input_encoding.as_deref().map(normalize_encoding_name).as_deref() {
            Some("tex-math-italic") => Some(127),
            Some("tex-math-symbols") => Some(48),
            _ => None,
        }
    }

    /// Turn kerns against the skew character into top accent positions and
    /// return the remaining kerns
    fn top_accents_from_skewchar(&mut self, kerns: Vec<KernPair>) -> Vec<KernPair> {
        if !self.settings.set_top_accent {
            return kerns;
        }
        let Some(skewchar) = self.skewchar() else {
            return kerns;
        };
        let (skews, kerns): (Vec<KernPair>, Vec<KernPair>) =
            kerns.into_iter().partition(|pair| pair.right.code() == Some(skewchar));

        for pair in skews {
            let name = self.glyph_name(&pair.left);
            if self.specified.top_accents.contains(&name) {
                continue;
            }
            match self.font.glyph_mut(&name) {
                Some(glyph) => {
                    let advance = (glyph.width + glyph.italic_correction) as f64;
                    glyph.top_accent = Some(round_units(advance / 2.0 + pair.kern as f64));
                }
                None => warn!("skewchar kern of unknown glyph {name} ignored"),
            }
        }
        kerns
    }

    fn build_kerning(&mut self, kerns: &[KernPair]) {
        if kerns.is_empty() {
            return;
        }
        let pairs: Vec<(String, String, i64)> = kerns
            .iter()
            .map(|pair| (self.glyph_name(&pair.left), self.glyph_name(&pair.right), pair.kern))
            .collect();
        let spec = LookupSpec {
            name: "gpos_pair",
            kind: LookupKind::GposPair,
            feature: Some("kern"),
            after: None,
        };

        if self.settings.kerning_classes {
            let mut table = KerningClassTable::from_pairs(pairs.iter().map(|(l, r, k)| (l.as_str(), r.as_str(), *k)));
            table.compact();
            debug!(
                left = table.left_classes.len(),
                right = table.right_classes.len(),
                "kerning classes"
            );
            self.subtable(spec, "gpos_pair_subtable")
                .push_rule(Rule::KerningClasses(table));
            return;
        }

        for (left, right, kern) in pairs {
            if self.font.glyph(&left).is_none() || self.font.glyph(&right).is_none() {
                warn!("kerning pair {left} {right} ignored, one of them is unknown");
                continue;
            }
            self.subtable(spec, "gpos_pair_subtable")
                .push_rule(Rule::Pair { left, right, kern });
        }
    }

    fn build_extensibles(&mut self) {
        let recipes = std::mem::take(&mut self.tables.extensibles);
        let bases: Vec<(String, String)> = self
            .tables
            .last_variants
            .iter()
            .map(|(variant, base)| (self.glyph_name(variant), self.glyph_name(base)))
            .collect();

        for recipe in recipes {
            let label = self.glyph_name(&recipe.label);
            let base = match bases.iter().find(|(variant, _)| *variant == label) {
                Some((_, base)) => {
                    self.detach_last_variant(base, &label);
                    base.clone()
                }
                None => label,
            };

            let components: Vec<VerticalComponent> = recipe
                .pieces
                .iter()
                .map(|piece| {
                    let glyph = self.glyph_name(&piece.glyph);
                    let depth = match self.font.glyph(&glyph) {
                        Some(g) => g.depth,
                        None => {
                            warn!("extensible piece {glyph} is unknown");
                            0
                        }
                    };
                    let connector = if piece.extender { depth } else { 0 };
                    VerticalComponent {
                        glyph,
                        extender: piece.extender,
                        start_connector: connector,
                        end_connector: connector,
                        full_advance: depth,
                    }
                })
                .collect();

            match self.font.glyph_mut(&base) {
                Some(glyph) => glyph.vertical_components = components,
                None => warn!("extensible recipe for unknown glyph {base} ignored"),
            }
        }
    }

    fn detach_last_variant(&mut self, base: &str, label: &str) {
        let font = &self.font;
        let generalized = self.settings.generalized_code;
        let charlist = self
            .tables
            .charlists
            .iter_mut()
            .find(|charlist| font.resolve_name(&charlist.base, generalized) == base);
        if let Some(charlist) = charlist {
            if charlist
                .variants
                .last()
                .is_some_and(|last| font.resolve_name(last, generalized) == label)
            {
                charlist.variants.pop();
            }
        }
    }

    fn build_charlists(&mut self) {
        for charlist in std::mem::take(&mut self.tables.charlists) {
            let base = self.glyph_name(&charlist.base);
            let variants: Vec<String> = charlist.variants.iter().map(|v| self.glyph_name(v)).collect();
            match self.font.glyph_mut(&base) {
                Some(glyph) => glyph.vertical_variants = variants,
                None => warn!("charlist of unknown glyph {base} ignored"),
            }
        }
    }

    fn apply_font_post_process(&mut self) {
        let post_process = self.font.info.post_process;
        if post_process.add_extrema {
            for glyph in &mut self.font.glyphs {
                for contour in &mut glyph.outline.contours {
                    self.engine.add_extrema(contour);
                }
            }
        }
        if post_process.round {
            for glyph in &mut self.font.glyphs {
                round_outline(&mut glyph.outline);
            }
        }
    }

    fn attach_references(&mut self) {
        for (name, referenced, transform) in std::mem::take(&mut self.tables.references) {
            match self.font.glyph_mut(&name) {
                Some(glyph) => glyph.references.push(Reference {
                    glyph: referenced,
                    transform,
                }),
                None => warn!("reference to {referenced} from unknown glyph {name} ignored"),
            }
        }
    }

    fn build_replacements(&mut self) {
        for (glyph, feature, replacement) in std::mem::take(&mut self.tables.replacements) {
            if self.font.glyph(&glyph).is_none() {
                warn!("glyph {glyph} doesn't exist while adding its {feature} replacement, ignored");
                continue;
            }
            let lookup = format!("gsub_single_{feature}");
            let spec = LookupSpec {
                name: &lookup,
                kind: LookupKind::GsubSingle,
                feature: Some(feature.as_str()),
                after: None,
            };
            self.subtable(spec, &format!("{lookup}_subtable"))
                .push_rule(Rule::Single { glyph, replacement });
        }
    }

    fn set_math_defaults(&mut self) {
        let info = &self.font.info;
        let em = info
            .units_per_em
            .map_or((info.ascent + info.descent) as f64, f64::from);
        let cap_height = match info.cap_height {
            Some(cap_height) if cap_height != 0 => cap_height,
            _ => info.ascent,
        } as f64;
        let constants = default_math_constants(&MathInputs {
            sigma: &self.sigma,
            xi: &self.xi,
            em,
            cap_height,
        });
        for (name, value) in constants {
            if !self.specified.math_constants.contains(name) {
                self.font.info.math_constants.insert(name.to_string(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use crate::engine::testing::RecordingEngine;
    use crate::font::{FontModel, Glyph};
    use crate::interpreter::tests::record;
    use crate::trace::TraceRecord;

    fn glyph(name: &str, code: i64) -> Glyph {
        Glyph::new(name, Some(code), None)
    }

    fn finish_with(settings: Settings, glyphs: Vec<Glyph>, records: &[TraceRecord]) -> FontModel {
        let mut interpreter = Interpreter::new(settings, RecordingEngine::new());
        for g in glyphs {
            interpreter.font.upsert_glyph(g);
        }
        interpreter.run(records);
        interpreter.finish()
    }

    fn rules<'f>(font: &'f FontModel, lookup: &str) -> &'f [Rule] {
        &font.lookups.get(lookup).expect("lookup exists").subtables[0].rules
    }

    fn fi_glyphs() -> Vec<Glyph> {
        vec![glyph("f", 102), glyph("i", 105), glyph("fi", 12)]
    }

    #[test]
    fn test_plain_ligature() {
        let font = finish_with(
            Settings::default(),
            fi_glyphs(),
            &[record("ligtable", "1>> \"f\""), record(":", "\"i\""), record("=:", "12")],
        );
        let lookup = font.lookups.get("gsub_ligature_liga").unwrap();
        assert_eq!(lookup.feature.as_deref(), Some("liga"));
        assert_eq!(lookup.subtables[0].name, "gsub_ligature_liga_subtable");
        assert_eq!(
            lookup.subtables[0].rules,
            vec![Rule::Ligature {
                components: vec!["f".to_string(), "i".to_string()],
                ligature: "fi".to_string()
            }]
        );
    }

    #[test]
    fn test_right_pipe_ligature() {
        let font = finish_with(
            Settings::default(),
            fi_glyphs(),
            &[record("ligtable", "1>> \"f\""), record(":", "\"i\""), record("=:p", "12")],
        );
        assert_eq!(
            rules(&font, "gsub_single_before_i"),
            &[Rule::Single {
                glyph: "f".to_string(),
                replacement: "fi".to_string()
            }]
        );
        let context = font.lookups.get(CONTEXT_CHAIN).unwrap();
        assert_eq!(context.feature.as_deref(), Some("calt"));
        assert_eq!(context.subtables[0].name, "gsub_contextchain_subtable_f_i");
        assert_eq!(
            context.subtables[0].rules,
            vec![Rule::ContextChain {
                rule: "| f @<gsub_single_before_i> | i".to_string()
            }]
        );
    }

    #[test]
    fn test_both_pipes_insert_between() {
        let font = finish_with(
            Settings::default(),
            fi_glyphs(),
            &[record("ligtable", "1>> \"f\""), record(":", "\"i\""), record("p=:p", "12")],
        );
        assert_eq!(
            rules(&font, "gsub_multiple_between_f_i"),
            &[Rule::Multiple {
                glyph: "i".to_string(),
                replacement: vec!["fi".to_string(), "i".to_string()]
            }]
        );
        assert_eq!(
            rules(&font, CONTEXT_CHAIN),
            &[Rule::ContextChain {
                rule: "f | i @<gsub_multiple_between_f_i> |".to_string()
            }]
        );
    }

    #[test]
    fn test_ligature_with_unknown_glyph_is_dropped() {
        let font = finish_with(
            Settings::default(),
            vec![glyph("f", 102), glyph("fi", 12)],
            &[record("ligtable", "1>> \"f\""), record(":", "\"i\""), record("=:", "12")],
        );
        assert!(font.lookups.is_empty());
    }

    #[test]
    fn test_skewchar_kerns_become_top_accents() {
        let settings = Settings {
            set_top_accent: true,
            skewchar: 127,
            ..Default::default()
        };
        let mut a = glyph("A", 65);
        a.width = 500;
        a.italic_correction = 20;
        let font = finish_with(
            settings,
            vec![a, glyph("B", 66), glyph("skew", 127)],
            &[
                record("ligtable", "1>> 65"),
                record(":", "127"),
                record("kern", "30>> 66"),
                record("kern", "-10"),
            ],
        );
        assert_eq!(font.glyph("A").and_then(|g| g.top_accent), Some(290));
        assert_eq!(
            rules(&font, "gpos_pair"),
            &[Rule::Pair {
                left: "A".to_string(),
                right: "B".to_string(),
                kern: -10
            }]
        );
    }

    #[test]
    fn test_kerning_classes_are_compacted() {
        let settings = Settings {
            kerning_classes: true,
            ..Default::default()
        };
        let font = finish_with(
            settings,
            vec![glyph("A", 65), glyph("V", 86), glyph("W", 87)],
            &[
                record("ligtable", "1>> \"A\""),
                record(":", "\"V\""),
                record("kern", "-80>> \"W\""),
                record("kern", "-80"),
            ],
        );
        let [Rule::KerningClasses(table)] = rules(&font, "gpos_pair") else {
            panic!("expected one class table");
        };
        assert_eq!(table.left_classes, vec![vec!["A".to_string()]]);
        assert_eq!(table.right_classes, vec![vec!["V".to_string(), "W".to_string()]]);
        assert_eq!(table.offsets, vec![vec![-80]]);
    }

    #[test]
    fn test_extensible_takes_last_variant() {
        let mut r = glyph("r", 114);
        r.depth = 100;
        let mut m = glyph("m", 109);
        m.depth = 50;
        let font = finish_with(
            Settings::default(),
            vec![glyph("p", 112), glyph("q", 113), glyph("x", 120), glyph("t", 116), r, m],
            &[
                record("charlist", "\"p\""),
                record(":", "\"q\""),
                record(":", "\"x\""),
                record("extensible", "\"x\""),
                record("", "\"t\">> \"m\">> 0>> \"r\""),
            ],
        );
        let p = font.glyph("p").unwrap();
        assert_eq!(p.vertical_variants, vec!["q".to_string()]);
        let components: Vec<(&str, bool, i64, i64, i64)> = p
            .vertical_components
            .iter()
            .map(|c| (c.glyph.as_str(), c.extender, c.start_connector, c.end_connector, c.full_advance))
            .collect();
        assert_eq!(
            components,
            vec![
                ("r", true, 100, 100, 100),
                ("m", false, 0, 0, 50),
                ("r", true, 100, 100, 100),
                ("t", false, 0, 0, 0)
            ]
        );
        assert!(font.glyph("x").unwrap().vertical_components.is_empty());
    }

    #[test]
    fn test_references_and_replacements() {
        let mut interpreter = Interpreter::new(Settings::default(), RecordingEngine::new());
        interpreter.font.upsert_glyph(glyph("A", 65));
        interpreter.font.upsert_glyph(glyph("A.ss01", -1));
        interpreter
            .tables
            .references
            .push(("A".to_string(), "B".to_string(), [1.0, 0.0, 0.0, 1.0, 10.0, 0.0]));
        interpreter
            .tables
            .replacements
            .push(("A".to_string(), "ss01".to_string(), "A.ss01".to_string()));
        interpreter
            .tables
            .replacements
            .push(("Z".to_string(), "ss01".to_string(), "Z.ss01".to_string()));
        let font = interpreter.finish();

        let a = font.glyph("A").unwrap();
        assert_eq!(a.references.len(), 1);
        assert_eq!(a.references[0].glyph, "B");
        assert_eq!(a.references[0].transform[4], 10.0);
        assert_eq!(
            rules(&font, "gsub_single_ss01"),
            &[Rule::Single {
                glyph: "A".to_string(),
                replacement: "A.ss01".to_string()
            }]
        );
    }

    #[test]
    fn test_math_defaults_keep_given_constants() {
        let settings = Settings {
            ascent: Some(800),
            descent: Some(200),
            ..Default::default()
        };
        let mut interpreter = Interpreter::new(settings, RecordingEngine::new());
        interpreter.sigma.insert(22, 250);
        interpreter.sigma.insert(5, 431);
        interpreter.font.info.math_constants.insert("AxisHeight".to_string(), 240);
        interpreter.specified.math_constants.insert("AxisHeight".to_string());
        let font = interpreter.finish();

        let constants = &font.info.math_constants;
        assert_eq!(constants.get("AxisHeight"), Some(&240));
        assert_eq!(constants.get("AccentBaseHeight"), Some(&431));
        assert_eq!(constants.get("SpaceAfterScript"), Some(&50));
        assert_eq!(constants.get("FlattenedAccentBaseHeight"), Some(&800));
    }
}

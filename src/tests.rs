//! Scenarios that run small synthetic compiler logs end to end, from the
//! tokenizer to the finished font.

#[cfg(test)]
mod trace_scenarios {
    use crate::core::config::Settings;
    use crate::core::errors::{FatalError, Skip};
    use crate::engine::testing::RecordingEngine;
    use crate::font::{FontModel, KerningClassTable, Rule};
    use crate::interpreter::{interpret, Interpreter};
    use crate::trace::{tokenize, TraceRecord, MARKER};

    const PROLOGUE: &str = "input mf2vec-prologue;";

    /// Counter-clockwise square with corners (x, 0) and (x + 10, 10)
    fn square(x: i32) -> String {
        let (a, b) = (x, x + 10);
        format!(
            "({a},0)..controls ({a},0) and ({b},0) ..({b},0)..controls ({b},0) and ({b},10) ..({b},10)\
             ..controls ({b},10) and ({a},10) ..({a},10)..controls ({a},10) and ({a},0) ..cycle"
        )
    }

    /// The square above, clockwise
    fn square_clockwise(x: i32) -> String {
        let (a, b) = (x, x + 10);
        format!(
            "({a},0)..controls ({a},0) and ({a},10) ..({a},10)..controls ({a},10) and ({b},10) ..({b},10)\
             ..controls ({b},10) and ({b},0) ..({b},0)..controls ({b},0) and ({a},0) ..cycle"
        )
    }

    #[derive(Default)]
    struct Log {
        text: String,
    }

    impl Log {
        fn new() -> Self {
            Self {
                text: format!("This is METAFONT, Version 2.71828182\n**{PROLOGUE}\n(mf2vec-prologue.mf)\n"),
            }
        }

        fn op(mut self, name: &str, body: &str) -> Self {
            if body.is_empty() {
                self.text.push_str(&format!("{MARKER}{name}{MARKER}\n"));
            } else {
                self.text.push_str(&format!("{MARKER}{name}>> {body}{MARKER}\n"));
            }
            self
        }

        fn noise(mut self, text: &str) -> Self {
            self.text.push_str(text);
            self
        }

        /// Ship the empty picture `p` as `code`, with hppp 1
        fn ship(self, code: i64, depth: i64) -> Self {
            self.op("shipout", &format!("1>> {code}>> 0>> 500>> 700>> {depth}>> 0>> 0>> 0>> 0>> 0"))
                .op("pic", "\"p\"")
        }

        fn records(&self) -> Vec<TraceRecord> {
            tokenize(&self.text, PROLOGUE).unwrap()
        }

        fn font(&self, settings: Settings) -> FontModel {
            interpret(&self.records(), settings, RecordingEngine::new())
        }

        fn run(&self) -> Interpreter<RecordingEngine> {
            let mut interpreter = Interpreter::new(Settings::default(), RecordingEngine::new());
            interpreter.run(&self.records());
            interpreter
        }
    }

    fn rules<'f>(font: &'f FontModel, lookup: &str) -> &'f [Rule] {
        &font.lookups.get(lookup).expect("lookup exists").subtables[0].rules
    }

    #[test]
    fn test_kern_between_two_glyphs() {
        let font = Log::new()
            .op("picture", "\"p\"")
            .ship(65, 0)
            .ship(66, 0)
            .op("ligtable", "1>> \"A\"")
            .op(":", "\"B\"")
            .op("kern", "10.0")
            .font(Settings::default());
        assert_eq!(
            rules(&font, "gpos_pair"),
            &[Rule::Pair {
                left: "A".to_string(),
                right: "B".to_string(),
                kern: 10
            }]
        );
        assert_eq!(font.lookups.get("gpos_pair").unwrap().feature.as_deref(), Some("kern"));
    }

    #[test]
    fn test_left_pipe_ligature_uses_preceding_context() {
        let font = Log::new()
            .op("picture", "\"p\"")
            .ship(65, 0)
            .ship(66, 0)
            .ship(76, 0)
            .op("ligtable", "1>> \"A\"")
            .op(":", "\"B\"")
            .op("p=:", "\"L\"")
            .font(Settings::default());
        assert_eq!(
            rules(&font, "gsub_single_after_A"),
            &[Rule::Single {
                glyph: "B".to_string(),
                replacement: "L".to_string()
            }]
        );
        assert_eq!(
            rules(&font, "gsub_contextchain"),
            &[Rule::ContextChain {
                rule: "A | B @<gsub_single_after_A> |".to_string()
            }]
        );
        assert_eq!(font.lookups.len(), 2);
    }

    #[test]
    fn test_last_charlist_variant_becomes_extensible() {
        let font = Log::new()
            .op("picture", "\"p\"")
            .ship(48, 0)
            .ship(49, 30)
            .ship(50, 60)
            .ship(51, 0)
            .op("charlist", "48")
            .op(":", "49")
            .op(":", "50")
            .op(":", "51")
            .op("extensible", "51")
            .op(":", "49>> 0>> 0>> 50")
            .font(Settings::default());

        let zero = font.glyph("zero").unwrap();
        assert_eq!(zero.vertical_variants, vec!["one".to_string(), "two".to_string()]);
        let assembly: Vec<(&str, bool, i64)> = zero
            .vertical_components
            .iter()
            .map(|c| (c.glyph.as_str(), c.extender, c.full_advance))
            .collect();
        assert_eq!(assembly, vec![("two", true, 60), ("one", false, 30)]);
        assert!(font.glyph("three").unwrap().vertical_components.is_empty());
    }

    #[test]
    fn test_cull_dropping_negative_leaves_one_clockwise_contour() {
        let interpreter = Log::new()
            .op("picture", "\"p\"")
            .op("addto", "\"p\"")
            .op("contour", &square(0))
            .op("withweight", "1")
            .op("addto", "\"p\"")
            .op("contour", &square(5))
            .op("withweight", "1")
            .op("cull", "\"p\"")
            .op("dropping", "(-4095.99998,0)")
            .run();
        let outline = &interpreter.pictures().get("p").unwrap().outline;
        assert_eq!(outline.len(), 1);
        assert!(outline.contours[0].is_clockwise());
        assert!(outline.contours[0].signed_area() < 0.0);
    }

    #[test]
    fn test_fill_orientation_ignores_source_direction() {
        for (path, turning) in [(square(0), "1"), (square_clockwise(0), "-1")] {
            for weight in [1i32, 2, -1, -2] {
                let interpreter = Log::new()
                    .op("picture", "\"p\"")
                    .op("addto", "\"p\"")
                    .op("turningcheck", "2")
                    .op("turningnumber", turning)
                    .op("contour", &path)
                    .op("withweight", &weight.to_string())
                    .run();
                let outline = &interpreter.pictures().get("p").unwrap().outline;
                assert_eq!(outline.len(), weight.unsigned_abs() as usize);
                for contour in outline.iter() {
                    assert_eq!(
                        contour.is_clockwise(),
                        weight > 0,
                        "turning number {turning}, weight {weight}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_double_negation_restores_picture() {
        let interpreter = Log::new()
            .op("picture", "\"p\">> \"q\">> \"r\"")
            .op("addto", "\"p\"")
            .op("contour", &square(0))
            .op("withweight", "1")
            .op("addto", "\"p\"")
            .op("contour", &square_clockwise(20))
            .op("withweight", "-1")
            .op("pic_eqn", "\"q\"")
            .op("as", "")
            .op("mi", "")
            .op("pic", "\"p\"")
            .op("pic_eqn", "\"r\"")
            .op("as", "")
            .op("mi", "")
            .op("pic", "\"q\"")
            .run();
        let pictures = interpreter.pictures();
        let p = &pictures.get("p").unwrap().outline;
        let q = &pictures.get("q").unwrap().outline;
        assert_eq!(&pictures.get("r").unwrap().outline, p);
        assert_ne!(q, p);
        assert!(q.iter().zip(p.iter()).all(|(a, b)| a.is_clockwise() != b.is_clockwise()));
        assert!(interpreter.skipped().is_empty(), "{:?}", interpreter.skipped());
    }

    #[test]
    fn test_picture_equations_run_without_warnings() {
        let interpreter = Log::new()
            .op("picture", "\"p\">> \"q\">> \"r\">> \"s\"")
            .op("addto", "\"p\"")
            .op("contour", &square(0))
            .op("withweight", "1")
            .op("pic_eqn", "\"q\"")
            .op("eq", "")
            .op("pic", "\"p\"")
            .op("pic_eqn", "\"r\"")
            .op("eq", "")
            .op("pic", "\"s\"")
            .op("eq", "")
            .op("pic", "\"p\"")
            .run();
        assert!(interpreter.skipped().is_empty(), "{:?}", interpreter.skipped());
        let pictures = interpreter.pictures();
        let p = &pictures.get("p").unwrap().outline;
        for name in ["q", "r", "s"] {
            assert_eq!(&pictures.get(name).unwrap().outline, p, "picture {name}");
        }
    }

    #[test]
    fn test_sum_in_equation_is_reported() {
        let interpreter = Log::new()
            .op("picture", "\"p\">> \"q\"")
            .op("pic_eqn", "\"q\"")
            .op("as", "")
            .op("pic", "\"p\"")
            .op("pl", "")
            .op("pic", "\"p\"")
            .run();
        assert_eq!(interpreter.skipped(), &[Skip::ComplexPictureExpression]);
    }

    #[test]
    fn test_addto_also_negated_picture() {
        let interpreter = Log::new()
            .op("picture", "\"p\">> \"q\"")
            .op("addto", "\"q\"")
            .op("contour", &square(0))
            .op("withweight", "1")
            .op("addto", "\"p\"")
            .op("also", "\"q\"")
            .op("addto", "\"p\"")
            .op("mi", "")
            .op("pic", "\"q\"")
            .run();
        assert!(interpreter.skipped().is_empty(), "{:?}", interpreter.skipped());
        let p = &interpreter.pictures().get("p").unwrap().outline;
        assert_eq!(p.len(), 2);
        assert!(p.contours[0].is_clockwise());
        assert!(!p.contours[1].is_clockwise());
        assert_eq!(p.contours[0].reversed(), p.contours[1]);
    }

    #[test]
    fn test_kerning_classes_are_already_compact() {
        let settings = Settings {
            kerning_classes: true,
            ..Default::default()
        };
        let font = Log::new()
            .op("picture", "\"p\"")
            .ship(65, 0)
            .ship(84, 0)
            .ship(86, 0)
            .ship(111, 0)
            .op("ligtable", "1>> \"A\"")
            .op(":", "\"V\"")
            .op("kern", "-80>> \"T\"")
            .op("kern", "-80>> \"o\"")
            .op("kern", "-40")
            .font(settings);
        let [Rule::KerningClasses(table)] = rules(&font, "gpos_pair") else {
            panic!("expected one class table");
        };
        let mut again: KerningClassTable = table.clone();
        again.compact();
        assert_eq!(&again, table);
        // V and T kern alike and share a class
        assert_eq!(table.right_classes.len(), 2);
        assert_eq!(table.offset("A", "V"), Some(-80));
        assert_eq!(table.offset("A", "T"), Some(-80));
        assert_eq!(table.offset("A", "o"), Some(-40));
    }

    #[test]
    fn test_error_reports_are_not_operands() {
        let records = Log::new()
            .op("picture", "\"p\"")
            .noise("! Strange path (turning number is zero).\n<to be read again>\n@mf2vec@addto>> \"x\"@mf2vec@\nl.12 fill z1--z2--cycle\n\n")
            .op("addto", "\"p\"")
            .records();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["picture", "addto"]);
        assert_eq!(records[1].body, "\"p\"");
    }

    #[test]
    fn test_missing_prologue_is_fatal() {
        let log = Log::new().op("picture", "\"p\"");
        let result = tokenize(&log.text, "input other-prologue;");
        assert!(matches!(result, Err(FatalError::MissingPrologue)));
    }
}

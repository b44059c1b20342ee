//! Pre-run over a trace
//!
//! Reaching a target units-per-em needs the font's extents before the real
//! run, because the compiler's resolution has to be chosen up front. This
//! scan only reads shipout boxes and the font extension's ascent and
//! descent; it builds nothing.

use super::shipout::ShipoutBox;
use crate::core::config::Settings;
use crate::geometry::utilities::round_units;
use crate::trace::{parse_number, Extension, FontCommand, Op, TraceRecord};
use serde::Serialize;
use tracing::{debug, warn};

/// Largest value the compiler accepts for most quantities
pub const MF_INFINITY: f64 = 4095.99998;
/// Largest value the compiler can compute with at all
pub const MF_OVERFLOW: f64 = 32767.99998;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Extents {
    pub ascent: i64,
    pub descent: i64,
}

/// Resolution for the real run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PpiPlan {
    pub ppi: f64,
    /// The font is built this many times smaller than the target
    pub ppi_factor: u32,
}

/// Tallest height and deepest depth of the shipped glyphs. Ascent and
/// descent from the settings or the font extension take precedence.
pub fn scan_extents(records: &[TraceRecord], settings: &Settings) -> Extents {
    let mut extents = Extents::default();
    let mut ascent_fixed = settings.ascent.is_some();
    let mut descent_fixed = settings.descent.is_some();
    let font_extension = settings.extension_enabled(Extension::Font);

    for record in records {
        match &record.op {
            Op::Shipout if !(ascent_fixed && descent_fixed) => match ShipoutBox::parse(record) {
                Ok(shipped) => {
                    if !ascent_fixed {
                        extents.ascent = extents.ascent.max(shipped.height);
                    }
                    if !descent_fixed {
                        extents.descent = extents.descent.max(shipped.depth);
                    }
                }
                Err(err) => warn!(line = ?record.line, "shipout box ignored in pre-run: {err}"),
            },
            Op::Font(command @ (FontCommand::Ascent | FontCommand::Descent)) if font_extension => {
                let Some(value) = scaled_value(record) else {
                    warn!(line = ?record.line, "malformed {} in pre-run", record.name);
                    continue;
                };
                if *command == FontCommand::Ascent {
                    extents.ascent = value;
                    ascent_fixed = true;
                } else {
                    extents.descent = value;
                    descent_fixed = true;
                }
            }
            _ => {}
        }
    }

    if let Some(ascent) = settings.ascent {
        extents.ascent = ascent;
    }
    if let Some(descent) = settings.descent {
        extents.descent = descent;
    }
    debug!(ascent = extents.ascent, descent = extents.descent, "pre-run extents");
    extents
}

/// `hppp>> value` as `round(value * hppp)`
fn scaled_value(record: &TraceRecord) -> Option<i64> {
    let fields = record.exact_fields(2).ok()?;
    let hppp = parse_number(fields[0]).ok()?;
    let value = parse_number(fields[1]).ok()?;
    Some(round_units(value * hppp))
}

/// Resolution that makes `ascent + descent` come out as the target
/// units-per-em, kept within the compiler's limits. `None` without a target
/// or without extents to scale.
pub fn target_ppi(settings: &Settings, extents: &Extents) -> Option<PpiPlan> {
    let upm = settings.upm?;
    let size = extents.ascent + extents.descent;
    if size <= 0 {
        return None;
    }
    let target = settings.ppi * f64::from(upm) / size as f64;

    let mut overflow_factor = 1.0;
    let mut ppi = target;
    while ppi > MF_OVERFLOW {
        overflow_factor += 1.0;
        ppi = target / overflow_factor;
    }

    let reduced = ppi;
    let mut ppi_factor = 1;
    while ppi > MF_INFINITY {
        ppi_factor += 1;
        ppi = reduced / f64::from(ppi_factor);
    }
    Some(PpiPlan { ppi, ppi_factor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Extensions;

    fn shipout(ht: &str, dp: &str) -> TraceRecord {
        TraceRecord::new(
            "shipout",
            None,
            &format!("10>> 65>> 0>> 50>> {ht}>> {dp}>> 0>> 0>> 0>> 0>> 0"),
        )
    }

    #[test]
    fn test_extents_from_shipouts() {
        let records = vec![shipout("70", "0"), shipout("68.3", "19.4"), shipout("60", "5")];
        let extents = scan_extents(&records, &Settings::default());
        assert_eq!(extents, Extents { ascent: 700, descent: 194 });
    }

    #[test]
    fn test_font_extension_pins_extents() {
        let settings = Settings {
            extensions: Extensions {
                font: true,
                ..Default::default()
            },
            descent: Some(250),
            ..Default::default()
        };
        let records = vec![
            shipout("70", "30"),
            TraceRecord::new("font_ascent", None, "10>> 80"),
            shipout("90", "30"),
        ];
        let extents = scan_extents(&records, &settings);
        assert_eq!(extents, Extents { ascent: 800, descent: 250 });

        let without_extension = scan_extents(&records, &Settings::default());
        assert_eq!(without_extension, Extents { ascent: 900, descent: 300 });
    }

    #[test]
    fn test_target_ppi_within_limits() {
        let settings = Settings {
            upm: Some(1000),
            ppi: 100.0,
            ..Default::default()
        };
        let plan = target_ppi(&settings, &Extents { ascent: 8, descent: 2 }).unwrap();
        assert_eq!(plan.ppi, 10000.0 / 3.0);
        assert_eq!(plan.ppi_factor, 3);

        let plan = target_ppi(&settings, &Extents { ascent: 750, descent: 250 }).unwrap();
        assert_eq!(plan, PpiPlan { ppi: 100.0, ppi_factor: 1 });

        let plan = target_ppi(&settings, &Extents { ascent: 1, descent: 0 }).unwrap();
        assert!(plan.ppi <= MF_INFINITY);
        assert_eq!(plan.ppi, 100000.0 / 4.0 / 7.0);

        assert_eq!(target_ppi(&settings, &Extents::default()), None);
        assert_eq!(target_ppi(&Settings::default(), &Extents { ascent: 8, descent: 2 }), None);
    }
}
